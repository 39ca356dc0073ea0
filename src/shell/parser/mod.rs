pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use parser::{ParseError, Parser};
