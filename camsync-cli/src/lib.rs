// camsync-cli/src/lib.rs
//
// Library portion of the camsync CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, PreprocessArgs, WorkspaceArgs};
pub use commands::RunContext;
pub use commands::calibrate::run_calibrate;
pub use commands::preprocess::run_preprocess;
pub use commands::process::run_process;
pub use error::CliResult;
