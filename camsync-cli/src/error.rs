// ============================================================================
// camsync-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: Adds a context line to core errors

// ---- Internal crate imports ----
use camsync_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Adds context to errors, converting them to `CoreError::OperationFailed`.
pub trait CliErrorContext<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", context, core_error))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_prefixed() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.cli_context("Failed to create log directory").unwrap_err();
        assert!(err.to_string().contains("Failed to create log directory"));
        assert!(err.to_string().contains("gone"));
    }
}
