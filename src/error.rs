use thiserror::Error;

/// Message shown when the server gave no usable reason for a failure.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed, please try again later.";

/// Every failure the client can surface, normalized to a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected credentials or an expired token.
    #[error("{0}")]
    Auth(String),

    /// Input rejected locally, before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// The request was rejected by the server or never reached it.
    #[error("{0}")]
    Service(String),

    #[error("{0}")]
    Storage(String),
}

impl ClientError {
    pub fn service(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => ClientError::Service(m),
            _ => ClientError::Service(DEFAULT_ERROR_MESSAGE.to_string()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClientError::Auth(m)
            | ClientError::Validation(m)
            | ClientError::Service(m)
            | ClientError::Storage(m) => m,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        log::debug!("transport error: {e}");
        ClientError::service(None)
    }
}

impl From<rusqlite::Error> for ClientError {
    fn from(e: rusqlite::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
