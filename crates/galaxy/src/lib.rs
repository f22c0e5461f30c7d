//! The galaxy protocol runner: configuration, the interaction driver and
//! its transport and rendering collaborators.

pub mod config;
pub mod interact;
pub mod render;
pub mod transport;

use std::path::Path;

use galaxy_core::GalaxyError;
use galaxy_eval::Evaluator;

pub use config::Config;
pub use interact::{Exchange, Interaction, Renderer, StepReport, Transport};
pub use render::{Canvas, CanvasRenderer, Presenter};
pub use transport::HttpTransport;

/// An evaluator with the prelude and, if given, the definitions in `program`.
pub fn load_evaluator(config: &Config, program: Option<&Path>) -> Result<Evaluator, GalaxyError> {
    let mut evaluator = Evaluator::with_prelude(config.cache_capacity)?;
    if let Some(path) = program {
        let src = std::fs::read_to_string(path)
            .map_err(|e| GalaxyError::Io(format!("cannot read {}: {e}", path.display())))?;
        let count = evaluator
            .load_program(&src)
            .map_err(|e| e.with_hint(format!("fix the definition in {}", path.display())))?;
        tracing::info!(path = %path.display(), count, "program loaded");
    }
    Ok(evaluator)
}
