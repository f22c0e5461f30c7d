use std::env;
use std::path::Path;
use std::str::FromStr;

use galaxy_core::GalaxyError;
use galaxy_eval::{SearchBudget, DEFAULT_CACHE_CAPACITY};
use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "https://icfpc2020-api.testkontur.ru";

/// Runtime settings: defaults, then an optional TOML file, then
/// `GALAXY_*` environment variables. The CLI applies its flags last.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server_url: String,
    pub api_key: String,
    pub cache_capacity: usize,
    pub max_steps: usize,
    pub max_queue: usize,
    pub max_successors: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let budget = SearchBudget::default();
        Config {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: String::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_steps: budget.max_steps,
            max_queue: budget.max_queue,
            max_successors: budget.max_successors,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults overridden by `path` (if given) and then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GalaxyError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_from(|key| env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, GalaxyError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GalaxyError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| e.with_note(format!("in config file {}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self, GalaxyError> {
        toml::from_str(content).map_err(|e| GalaxyError::Config(e.message().to_string()))
    }

    /// Apply `GALAXY_*` overrides looked up through `var`.
    pub fn with_env_from(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GalaxyError> {
        if let Some(url) = var("GALAXY_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(key) = var("GALAXY_API_KEY") {
            self.api_key = key;
        }
        if let Some(n) = parsed(&var, "GALAXY_CACHE_CAPACITY")? {
            self.cache_capacity = n;
        }
        if let Some(n) = parsed(&var, "GALAXY_MAX_STEPS")? {
            self.max_steps = n;
        }
        if let Some(n) = parsed(&var, "GALAXY_MAX_QUEUE")? {
            self.max_queue = n;
        }
        if let Some(n) = parsed(&var, "GALAXY_MAX_SUCCESSORS")? {
            self.max_successors = n;
        }
        if let Some(secs) = parsed(&var, "GALAXY_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = secs;
        }
        Ok(self)
    }

    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_steps: self.max_steps,
            max_queue: self.max_queue,
            max_successors: self.max_successors,
        }
    }
}

fn parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, GalaxyError> {
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| GalaxyError::Config(format!("{key} must be a count, got {raw:?}")))
        })
        .transpose()
}
