pub mod builtins;
mod executor;
pub mod parser;
mod readline;
#[allow(clippy::module_inception)]
mod shell;
mod signals;

pub use shell::Shell;
