use thiserror::Error;

/// The single failure kind the controllers recognize. Network
/// unreachability, non-success statuses, and malformed payloads all
/// collapse into it; callers translate it into state, never propagate it.
#[derive(Debug, Error)]
#[error("character data source failure: {message}")]
pub struct DataSourceError {
    message: String,
}

impl DataSourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DataSourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}
