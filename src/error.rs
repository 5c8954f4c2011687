use std::{fmt, io};
use thiserror::Error;

/// Errors raised while encoding or decoding the control envelope
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("I/O: {0}")]
    IO(String),
    #[error("Bad message: {0}")]
    BadMessage(String),
    #[error("Unexpected EOF on stream")]
    UnexpectedEof,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            kind => Self::IO(kind.to_string()),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::BadMessage(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::BadMessage(msg.to_string())
    }
}
