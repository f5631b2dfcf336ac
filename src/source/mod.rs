//! Trace input sources.
//!
//! A trace comes either from a file path argument or from piped stdin.
//! Both are read wholesale: the parser has no streaming mode, so a refresh
//! always re-reads the complete trace.

use crate::model::InputError;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

/// Where the trace bytes come from. Sum type enforces exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A trace file on disk; can be re-read for follow mode.
    File(PathBuf),
    /// Piped stdin, read once to EOF.
    Stdin,
}

impl InputSource {
    /// Read the complete trace.
    ///
    /// Job output is not guaranteed to be valid UTF-8 (truncated escape
    /// sequences, binary tool output), so invalid bytes are replaced
    /// lossily instead of failing the whole view.
    ///
    /// # Errors
    ///
    /// Returns `InputError` when the file or stdin cannot be read.
    pub fn read_trace(&self) -> Result<String, InputError> {
        match self {
            InputSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|source| InputError::FileRead {
                    path: path.clone(),
                    source,
                })?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            InputSource::Stdin => {
                let mut bytes = Vec::new();
                std::io::stdin()
                    .lock()
                    .read_to_end(&mut bytes)
                    .map_err(InputError::StdinRead)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    /// Whether the source can be re-read for follow mode.
    pub fn is_followable(&self) -> bool {
        matches!(self, InputSource::File(_))
    }

    /// Short name for the status bar.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            InputSource::Stdin => "stdin".to_string(),
        }
    }
}

/// Detect and validate the input source.
///
/// A provided file path wins; otherwise stdin is used when it is piped.
/// An interactive terminal on stdin with no path is a usage error, not a
/// hang.
///
/// # Errors
///
/// Returns `InputError::FileNotFound` for a missing path and
/// `InputError::NoInput` when there is nothing to read.
pub fn detect_input_source(file: Option<PathBuf>) -> Result<InputSource, InputError> {
    match file {
        Some(path) => {
            if !path.exists() {
                return Err(InputError::FileNotFound { path });
            }
            Ok(InputSource::File(path))
        }
        None => {
            if std::io::stdin().is_terminal() {
                return Err(InputError::NoInput);
            }
            Ok(InputSource::Stdin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_path_creates_file_source() {
        let path = std::env::temp_dir().join("citv_source_detect.log");
        fs::write(&path, "hello\n").unwrap();

        let source = detect_input_source(Some(path.clone())).unwrap();
        assert_eq!(source, InputSource::File(path.clone()));
        assert!(source.is_followable());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let path = std::env::temp_dir().join("citv_source_missing_does_not_exist.log");
        let err = detect_input_source(Some(path.clone())).unwrap_err();
        match err {
            InputError::FileNotFound { path: reported } => assert_eq!(reported, path),
            other => panic!("Expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn file_source_reads_complete_trace() {
        let path = std::env::temp_dir().join("citv_source_read.log");
        fs::write(&path, "line one\nline two\n").unwrap();

        let trace = InputSource::File(path.clone()).read_trace().unwrap();
        assert_eq!(trace, "line one\nline two\n");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let path = std::env::temp_dir().join("citv_source_latin1.log");
        fs::write(&path, b"caf\xe9\n").unwrap();

        let trace = InputSource::File(path.clone()).read_trace().unwrap();
        assert!(trace.contains('\u{fffd}'));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn stdin_source_is_not_followable() {
        assert!(!InputSource::Stdin.is_followable());
    }

    #[test]
    fn display_name_uses_file_name_only() {
        let source = InputSource::File(PathBuf::from("/var/log/traces/job-42.log"));
        assert_eq!(source.display_name(), "job-42.log");
        assert_eq!(InputSource::Stdin.display_name(), "stdin");
    }

    #[test]
    fn deleted_file_read_maps_to_file_read_error() {
        let path = std::env::temp_dir().join("citv_source_deleted.log");
        fs::write(&path, "x").unwrap();
        let source = detect_input_source(Some(path.clone())).unwrap();
        fs::remove_file(&path).unwrap();

        match source.read_trace() {
            Err(InputError::FileRead { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("Expected FileRead error, got {other:?}"),
        }
    }
}
