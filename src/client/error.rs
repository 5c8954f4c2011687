use thiserror::Error;

use super::state::SessionState;
use crate::protocol::{CommandKind, ExceptionCode};

/// Reasons a command is rejected locally, before it reaches the service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The command is not legal in the current session state
    #[error("{command:?} is not allowed while {state:?}")]
    IllegalState {
        state: SessionState,
        command: CommandKind,
    },
    /// A caller-side argument check failed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The service is not running
    #[error("Control channel closed")]
    ChannelClosed,
}

impl Error {
    /// Reply code a caller would have seen had the service rejected the command
    pub fn code(&self) -> ExceptionCode {
        match self {
            Self::InvalidArgument(_) => ExceptionCode::FileNotFound,
            Self::IllegalState { .. } | Self::ChannelClosed => ExceptionCode::IllegalState,
        }
    }
}
