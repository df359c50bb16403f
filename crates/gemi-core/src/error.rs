use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::plugin::CodecError),
}

pub type Result<T> = std::result::Result<T, Error>;
