pub mod error;
pub mod op;
pub mod term;
pub mod value;

pub use error::{GalaxyError, Span};
pub use op::Op;
pub use term::{Term, TermArena, TermId};
pub use value::{Point, Value};
