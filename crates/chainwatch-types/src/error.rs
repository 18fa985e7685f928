use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainwatchError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChainwatchError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, ChainwatchError>;
