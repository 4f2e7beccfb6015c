//! Error handling for the job service.

use jobshell_pty::ShellError;
use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur during job service operations.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Malformed id, unsupported attribute or scheme, or similar input error.
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    /// The shell to the resource manager could not be (re)established.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// The scheduler did not accept the job.
    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    /// A state or exit code query failed.
    #[error("Query failed: {0}")]
    QueryFailure(String),

    /// The scheduler refused to cancel the job.
    #[error("Cancellation failed: {0}")]
    CancellationFailure(String),

    /// Operation not valid in the job's current lifecycle state.
    #[error("Incorrect state: {0}")]
    IncorrectState(String),

    /// Invalid adaptor configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from the underlying shell session.
    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedError {
    /// Promote a shell-level parameter error to a scheduler-level one.
    pub(crate) fn from_shell(err: ShellError) -> Self {
        match err {
            ShellError::BadParameter(msg) => SchedError::BadParameter(msg),
            other => SchedError::Shell(other),
        }
    }
}
