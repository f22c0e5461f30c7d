#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;

use galaxy::{Config, Interaction, Renderer, Transport};
use galaxy_core::{GalaxyError, Point};
use tempfile::TempDir;

pub const STATEFULDRAW: &str = "statefuldraw = ap ap b ap b ap ap s ap ap b ap b ap cons 0 ap ap c ap ap b b cons ap ap c cons nil ap ap c cons nil ap c cons";

/// `relay state input = [car input, input, cdr input]`: a click `(f, p)`
/// sends `p` when `f` is nonzero, and the reply decides the next flag.
pub const RELAY: &str = "relay = ap t ap ap s ap ap b cons car ap ap s cons ap ap c ap ap b cons cdr nil";

/// Replies from a fixed script and records what was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    pub replies: VecDeque<String>,
    pub sent: Vec<String>,
}

impl ScriptedTransport {
    pub fn new<I: IntoIterator<Item = String>>(replies: I) -> Self {
        ScriptedTransport {
            replies: replies.into_iter().collect(),
            sent: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bits: &str) -> Result<String, GalaxyError> {
        self.sent.push(bits.to_string());
        self.replies
            .pop_front()
            .ok_or_else(|| GalaxyError::transport("script exhausted"))
    }
}

/// Keeps every frame it was asked to draw.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Vec<Vec<Point>>>,
}

impl Renderer for RecordingRenderer {
    fn clear(&mut self) {
        self.frames.push(Vec::new());
    }

    fn draw(&mut self, points: &[Point]) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(points.to_vec());
        }
    }
}

pub fn interaction(
    program: &str,
    protocol: &str,
    transport: ScriptedTransport,
) -> Interaction<ScriptedTransport, RecordingRenderer> {
    let mut evaluator = galaxy_eval::Evaluator::new();
    evaluator
        .load_program(program)
        .unwrap_or_else(|e| panic!("program failed to load: {e}"));
    Interaction::new(evaluator, protocol, transport, RecordingRenderer::default())
        .unwrap_or_else(|e| panic!("protocol `{protocol}` failed: {e}"))
}

/// Write `content` into a fresh temp dir; keep the dir alive while using the path.
pub fn temp_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

pub fn small_config() -> Config {
    Config {
        cache_capacity: 1 << 12,
        ..Config::default()
    }
}
