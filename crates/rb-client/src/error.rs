use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewBoardError {
    #[error("login failed: {message}")]
    Authentication { message: String },
    #[error("{message} (error {code})")]
    Api { code: i64, message: String },
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid server url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unexpected response from server: {reason}")]
    InvalidResponse { reason: String },
    #[error("unsupported API version: {version}")]
    UnsupportedApiVersion { version: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ReviewBoardError>;
