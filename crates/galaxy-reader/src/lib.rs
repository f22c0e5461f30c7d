pub mod lexer;
mod reader;

pub use reader::read_definition;
pub use reader::read_program;
pub use reader::read_term;
pub use reader::Definition;
