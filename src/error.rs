use thiserror::Error;

/// The error taxonomy threaded through every fallible boundary of the harvester.
///
/// Each variant maps to one row of the error-handling design: `Configuration` and
/// `Auth` are never retried by [`crate::retry`], `Transport`/`RateLimit`/`Sink` are,
/// and `State` is logged but never surfaced as a failure.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limit exhausted: {0}")]
    RateLimit(String),

    #[error("remote query error: {message} (consider reducing page size)")]
    RemoteQuery { message: String },

    #[error("state store error: {0}")]
    State(String),

    #[error("row sink error: {0}")]
    Sink(String),

    #[error("gave up after {attempts} attempt(s): {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}

pub type Result<T> = std::result::Result<T, HarvestError>;

impl From<octocrab::Error> for HarvestError {
    fn from(err: octocrab::Error) -> Self {
        HarvestError::Transport(err.to_string())
    }
}

impl From<csv::Error> for HarvestError {
    fn from(err: csv::Error) -> Self {
        HarvestError::Sink(err.to_string())
    }
}

impl From<std::io::Error> for HarvestError {
    fn from(err: std::io::Error) -> Self {
        HarvestError::State(err.to_string())
    }
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::State(err.to_string())
    }
}
