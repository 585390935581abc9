use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Unknown mode: {0}")]
    Mode(String),
    #[error("Stream has no buffered writes to flush")]
    NotWriting,
    #[error("Stream is not attached to a child process")]
    NotPiped,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<io::ErrorKind> for StreamError {
    fn from(kind: io::ErrorKind) -> Self {
        Self::Io(io::Error::from(kind))
    }
}
