//! Shared primitives used across Trellis crates.

/// Result alias used across the workspace.
pub type TrellisResult<T> = Result<T, TrellisError>;

/// Workspace error: a dotted machine-readable code plus a human message.
///
/// Codes are grouped by the crate that raises them (`dom.*`, `storage.*`, `markup.*`,
/// `path.*`, `cli.*`) so callers can branch on the failure family without
/// string matching the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TrellisError {
    pub code: &'static str,
    pub message: String,
}

impl TrellisError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the code belongs to the given family, e.g. `"storage"`.
    pub fn is_family(&self, family: &str) -> bool {
        self.code
            .split_once('.')
            .is_some_and(|(prefix, _)| prefix == family)
    }
}
