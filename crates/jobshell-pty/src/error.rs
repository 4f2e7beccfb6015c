//! Error handling for shell sessions.

use thiserror::Error;

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors that can occur while driving a shell session.
#[derive(Error, Debug)]
pub enum ShellError {
    /// A caller-supplied value was rejected before any I/O happened.
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    /// The shell could not be started or bootstrapped.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// A command was sent but its completion could not be established.
    #[error("No success: {0}")]
    NoSuccess(String),

    /// The pseudo-terminal system refused an operation.
    #[error("PTY error: {0}")]
    Pty(String),

    /// IO error while talking to the terminal.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShellError::BadParameter("can only run foreground jobs".to_string());
        assert_eq!(err.to_string(), "Bad parameter: can only run foreground jobs");

        let err = ShellError::NoSuccess("run_sync failed, no prompt (ls)".to_string());
        assert_eq!(err.to_string(), "No success: run_sync failed, no prompt (ls)");
    }
}
