//! Error types for the citv application.
//!
//! A small `thiserror` taxonomy: [`AppError`] wraps the fatal failure
//! modes (input access, terminal I/O). Trace parsing contributes no error
//! type at all — every malformed byte sequence degrades to literal content,
//! so the parser is a total function.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
///
/// Domain errors convert into this via `From`, so startup code composes
/// with `?`. All variants are fatal: without readable input or a working
/// terminal there is nothing to display.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the trace from a file or stdin.
    #[error("Failed to read input: {0}")]
    Input(#[from] InputError),

    /// Terminal or TUI rendering error from the crossterm/ratatui layer.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Errors encountered when reading the trace from a file or stdin.
///
/// The variants are kept distinct (not collapsed into a generic I/O error)
/// so the startup path can print targeted messages: a bad path suggests
/// checking the argument, while a missing pipe suggests usage help.
#[derive(Debug, Error)]
pub enum InputError {
    /// The trace file does not exist at the given path.
    #[error("Trace file not found: {path:?}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// The trace file exists but could not be read.
    #[error("Failed to read trace file {path:?}: {source}")]
    FileRead {
        /// The path that was attempted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading piped stdin failed.
    #[error("Failed to read stdin: {0}")]
    StdinRead(#[source] std::io::Error),

    /// No file argument was given and stdin is an interactive terminal.
    #[error("No input: pass a trace file path or pipe a trace to stdin")]
    NoInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_converts_to_app_error() {
        fn fails() -> Result<(), AppError> {
            Err(InputError::NoInput)?
        }
        match fails() {
            Err(AppError::Input(InputError::NoInput)) => {}
            other => panic!("Expected Input(NoInput), got {other:?}"),
        }
    }

    #[test]
    fn io_error_converts_to_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let app: AppError = io.into();
        assert!(matches!(app, AppError::Terminal(_)));
    }

    #[test]
    fn file_not_found_message_names_the_path() {
        let err = InputError::FileNotFound {
            path: PathBuf::from("/tmp/trace.txt"),
        };
        assert!(err.to_string().contains("/tmp/trace.txt"));
    }
}
