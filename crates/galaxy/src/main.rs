use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use galaxy::{load_evaluator, Canvas, CanvasRenderer, Config, HttpTransport, Interaction, Presenter};
use galaxy_core::{GalaxyError, Point};
use galaxy_eval::{Goal, RuleSet, Simplifier};
use galaxy_modem::{demodulate, modulate, value_to_term};

#[derive(Parser)]
#[command(name = "galaxy", version, about = "Galaxy: combinator evaluator and protocol runner")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an expression by graph reduction
    Eval {
        expr: String,
        /// Definitions to load first
        #[arg(long)]
        program: Option<PathBuf>,
    },
    /// Simplify an expression by rewrite search
    Simplify {
        expr: String,
        #[arg(long)]
        program: Option<PathBuf>,
        /// Extra `<pattern> = <replacement>` rules
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        max_steps: Option<usize>,
        /// Stop at the first term made only of data
        #[arg(long)]
        data: bool,
    },
    /// Evaluate an expression to data and print its modulation
    Modulate { expr: String },
    /// Decode a modulated bit string
    Demodulate { bits: String },
    /// Run a protocol, one step per click
    Interact {
        #[arg(long)]
        program: PathBuf,
        #[arg(long, default_value = "galaxy")]
        protocol: String,
        /// Click at X,Y; read `x y` lines from stdin when absent
        #[arg(long = "click", value_parser = parse_point)]
        clicks: Vec<Point>,
        #[arg(long)]
        server_url: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(|c: char| c == ',' || c.is_whitespace())
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<i64>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok((coord(x)?, coord(y)?))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if let Some(note) = e.note() {
            eprintln!("  note: {note}");
        }
        if let Some(hint) = e.hint() {
            eprintln!("  hint: {hint}");
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), GalaxyError> {
    let mut config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Eval { expr, program } => {
            let mut ev = load_evaluator(&config, program.as_deref())?;
            let result = ev.eval_str(&expr)?;
            println!("{}", ev.arena().display(result));
            let sugar = ev.arena().sugar(result);
            if sugar != ev.arena().display(result) {
                println!("{sugar}");
            }
        }
        Command::Simplify {
            expr,
            program,
            rules,
            max_steps,
            data,
        } => {
            if let Some(n) = max_steps {
                config.max_steps = n;
            }
            simplify(&config, &expr, program.as_deref(), rules.as_deref(), data)?;
        }
        Command::Modulate { expr } => {
            let mut ev = load_evaluator(&config, None)?;
            let term = ev.read(&expr)?;
            println!("{}", modulate(&ev.force_value(term)?));
        }
        Command::Demodulate { bits } => {
            let value = demodulate(&bits)?;
            let mut ev = load_evaluator(&config, None)?;
            let term = value_to_term(ev.arena_mut(), &value);
            println!("{}", ev.arena().display(term));
            println!("{value}");
        }
        Command::Interact {
            program,
            protocol,
            clicks,
            server_url,
            api_key,
        } => {
            if let Some(url) = server_url {
                config.server_url = url;
            }
            if let Some(key) = api_key {
                config.api_key = key;
            }
            interact(&config, &program, &protocol, clicks)?;
        }
    }
    Ok(())
}

fn simplify(
    config: &Config,
    expr: &str,
    program: Option<&Path>,
    rules_path: Option<&Path>,
    data: bool,
) -> Result<(), GalaxyError> {
    let mut ev = load_evaluator(config, program)?;
    let mut rules = RuleSet::standard(ev.arena_mut())?;
    rules.add_definitions(&ev)?;
    if let Some(path) = rules_path {
        let src = std::fs::read_to_string(path)?;
        rules
            .load(ev.arena_mut(), &src)
            .map_err(|e| e.with_hint(format!("fix the rule in {}", path.display())))?;
    }
    let term = ev.read(expr)?;
    let goal = if data { Goal::Data } else { Goal::NormalForm };
    let out = Simplifier::new(&rules, config.budget()).simplify_until(ev.store_mut(), term, goal)?;
    println!("{}", ev.arena().display(out.term));
    println!("{:?} after {} step(s)", out.status, out.steps);
    Ok(())
}

fn interact(
    config: &Config,
    program: &Path,
    protocol: &str,
    clicks: Vec<Point>,
) -> Result<(), GalaxyError> {
    let ev = load_evaluator(config, Some(program))?;
    let transport = HttpTransport::new(
        &config.server_url,
        &config.api_key,
        Some(Duration::from_secs(config.request_timeout_secs)),
    )?;
    let canvas = Arc::new(Mutex::new(Canvas::new()));
    let (presenter, renderer) = Presenter::spawn(canvas, std::io::stdout());
    let mut interaction = Interaction::new(ev, protocol, transport, renderer)?;

    let result = if clicks.is_empty() {
        let mut outcome = Ok(());
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    outcome = Err(e.into());
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let point = match parse_point(line.trim()) {
                Ok(point) => point,
                Err(msg) => {
                    eprintln!("{msg}");
                    continue;
                }
            };
            if let Err(e) = click(&mut interaction, point) {
                outcome = Err(e);
                break;
            }
        }
        outcome
    } else {
        clicks
            .into_iter()
            .try_for_each(|point| click(&mut interaction, point))
    };

    drop(interaction);
    presenter.join();
    result
}

fn click(
    interaction: &mut Interaction<HttpTransport, CanvasRenderer>,
    (x, y): Point,
) -> Result<(), GalaxyError> {
    let report = interaction.click(x, y)?;
    eprintln!(
        "click ({x}, {y}): {} image(s), {} exchange(s), state {}",
        report.images.len(),
        report.exchanges.len(),
        report.state
    );
    Ok(())
}
