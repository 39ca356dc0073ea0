#[allow(clippy::module_inception)]
mod executor;
mod status;

pub use executor::{ExecError, Executor};
pub use status::ProcessStatus;
