// error.rs — Error types for the audit subsystem.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up audit emission.
///
/// Emission itself is infallible from the caller's view: sink failures
/// after startup are logged, never propagated.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The audit log file could not be opened for append.
    #[error("failed to open audit log '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
