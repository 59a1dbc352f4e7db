use thiserror::Error;

use crate::extract::ExtractError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("bad URL `{0}`")]
    BadUrl(String),
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response is not valid UTF-8: {0}")]
    Decode(String),
}

/// Why a chapter could not be turned into normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl LoadError {
    /// Timeouts and transport hiccups are worth a retry; a missing container is not
    /// going to appear on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoadError::Network(
                NetworkError::Timeout(_) | NetworkError::Transport(_) | NetworkError::Status { .. }
            )
        )
    }
}
