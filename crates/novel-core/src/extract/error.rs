use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("chapter content not found")]
    ContentNotFound,
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("invalid base URL `{0}`")]
    InvalidBaseUrl(String),
}
