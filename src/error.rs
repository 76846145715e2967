// ABOUTME: Error types for job-status polling
// ABOUTME: Separates transient transport failures from permanent payload validation failures

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PollerError {
    /// The request never produced a response (connect, timeout, TLS).
    Transport(String),
    /// The service answered with a non-success status code.
    Http { status: u16, body: String },
    /// The response body did not match the expected job document.
    Validation(String),
    Config(String),
}

impl PollerError {
    /// Whether the failure may clear up on the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(self, PollerError::Transport(_) | PollerError::Http { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PollerError::Validation(_))
    }
}

impl fmt::Display for PollerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PollerError::Transport(msg) => write!(f, "Transport error: {}", msg),
            PollerError::Http { status, body } => {
                write!(f, "Server returned status {}: {}", status, body)
            }
            PollerError::Validation(msg) => {
                write!(f, "Did not understand response: {}", msg)
            }
            PollerError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PollerError {}

impl From<serde_json::Error> for PollerError {
    fn from(err: serde_json::Error) -> Self {
        PollerError::Validation(err.to_string())
    }
}
