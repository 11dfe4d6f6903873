//! Structured errors, serializable for `--json` reporting

use serde::{Deserialize, Serialize};
use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("[{code:?}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad flag value, extension, placeholder placement or key label
    InvalidArgument,
    /// Filesystem state forbids the operation (missing file, no overwrite, empty queue)
    Precondition,
    /// Timeline file content is unusable
    Format,
    /// Filesystem open/read/write failure
    Io,
    /// Keyboard discovery or virtual keyboard creation failure
    Device,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: Vec::new(),
            context: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Precondition, message)
    }

    pub fn unknown_label(role: &str, label: &str) -> Self {
        Self::invalid_argument(format!("unknown key label for {} key: {}", role, label))
    }

    pub fn malformed_line(path: &Path, line: usize, reason: &str) -> Self {
        Self::new(
            ErrorCode::Format,
            format!("file contains a malformed line: {}", reason),
        )
        .with_context(serde_json::json!({
            "path": path.display().to_string(),
            "line": line,
        }))
    }

    pub fn blacklisted_label(path: &Path, line: usize, label: &str) -> Self {
        Self::new(
            ErrorCode::Format,
            format!("file contains a blacklisted key: {}", label),
        )
        .with_context(serde_json::json!({
            "path": path.display().to_string(),
            "line": line,
        }))
    }

    pub fn empty_timeline(path: &Path) -> Self {
        Self::new(
            ErrorCode::Format,
            format!("file does not contain recorded inputs: {}", path.display()),
        )
    }

    pub fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
        Self::new(
            ErrorCode::Io,
            format!("failed to {} {}: {}", action, path.display(), err),
        )
    }

    pub fn device(action: &str, err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::Device, format!("{} failed: {}", action, err))
    }
}
