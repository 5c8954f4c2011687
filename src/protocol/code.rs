use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Closed set of result codes carried by every reply.
/// `Ok` is zero, every failure is a distinct negative integer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExceptionCode {
    #[error("Ok")]
    Ok = 0,
    #[error("Unknown")]
    Unknown = -1,
    #[error("Illegal state")]
    IllegalState = -2,
    #[error("File not found")]
    FileNotFound = -3,
    #[error("I/O")]
    Io = -4,
    #[error("Illegal reply from server")]
    ProtocolIllegalReply = -5,
    #[error("Protocol error")]
    ProtocolError = -6,
    #[error("Data transfer error")]
    DataTransferError = -7,
    #[error("Transfer aborted")]
    TransferAborted = -8,
    #[error("List parse error")]
    ListParseError = -9,
}

impl ExceptionCode {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<i32> for ExceptionCode {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Ok,
            -2 => Self::IllegalState,
            -3 => Self::FileNotFound,
            -4 => Self::Io,
            -5 => Self::ProtocolIllegalReply,
            -6 => Self::ProtocolError,
            -7 => Self::DataTransferError,
            -8 => Self::TransferAborted,
            -9 => Self::ListParseError,
            _ => Self::Unknown,
        }
    }
}

impl From<ExceptionCode> for i32 {
    fn from(code: ExceptionCode) -> Self {
        code as i32
    }
}

impl Serialize for ExceptionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(i32::from(*self))
    }
}

impl<'de> Deserialize<'de> for ExceptionCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(i32::from(ExceptionCode::Ok), 0);
        assert_eq!(i32::from(ExceptionCode::TransferAborted), -8);
        assert_eq!(i32::from(ExceptionCode::ListParseError), -9);
    }

    #[test]
    fn test_unknown_integer() {
        assert_eq!(ExceptionCode::from(-42), ExceptionCode::Unknown);
        assert_eq!(ExceptionCode::from(7), ExceptionCode::Unknown);
        assert_eq!(ExceptionCode::from(-6), ExceptionCode::ProtocolError);
    }
}
