use crate::{port::PortError, protocol::ExceptionCode};

/// Maps a port failure onto the closed reply code set by category, never by message
pub fn classify(error: &PortError) -> ExceptionCode {
    let code = match error {
        PortError::IllegalState(_) => ExceptionCode::IllegalState,
        PortError::FileNotFound(_) => ExceptionCode::FileNotFound,
        PortError::Io(_) => ExceptionCode::Io,
        PortError::IllegalReply => ExceptionCode::ProtocolIllegalReply,
        PortError::Ftp { .. } => ExceptionCode::ProtocolError,
        PortError::DataTransfer(_) => ExceptionCode::DataTransferError,
        PortError::Aborted => ExceptionCode::TransferAborted,
        PortError::ListParse(_) => ExceptionCode::ListParseError,
        PortError::Other(msg) => {
            error!("unrecognized failure: {}", msg);
            return ExceptionCode::Unknown;
        }
    };

    warn!("{}: {}", code, error);
    code
}
