mod code;
mod command;
mod file;
mod reply;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{de, error::Error, ser, utils::MAX_FRAME_LENGTH};

pub use self::{
    code::ExceptionCode,
    command::{Command, CommandKind},
    file::{FileKind, FileRecord},
    reply::{Payload, Reply, ReplyKind},
};

const FTP_START: u8 = 1;
const FTP_STOP: u8 = 2;
const FTP_CONNECT: u8 = 3;
const FTP_DISCONNECT: u8 = 4;
const FTP_LOGIN: u8 = 5;
const FTP_LOGOUT: u8 = 6;
const FTP_PWD: u8 = 7;
const FTP_CD: u8 = 8;
const FTP_CDUP: u8 = 9;
const FTP_LIST: u8 = 10;
const FTP_LIST_NAMES: u8 = 11;
const FTP_DOWNLOAD: u8 = 12;
const FTP_ABORT: u8 = 13;

const FTP_EVENT_MIN: u8 = 100;

const FTP_DOWNLOAD_STARTED: u8 = 101;
const FTP_DOWNLOAD_TRANSFERRED: u8 = 102;
const FTP_DOWNLOAD_COMPLETED: u8 = 103;
const FTP_DOWNLOAD_ABORTED: u8 = 104;
const FTP_DOWNLOAD_FAILED: u8 = 105;
const FTP_DOWNLOAD_QUEUE: u8 = 106;

/// Command envelope as it crosses the control channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u32,
    pub command: Command,
}

macro_rules! impl_frame_for {
    ($name:ident) => {
        /// Encodes a length-prefixed frame
        impl TryFrom<&$name> for Bytes {
            type Error = Error;

            fn try_from(value: &$name) -> Result<Self, Self::Error> {
                frame(ser::to_bytes(value)?)
            }
        }

        /// Decodes a frame body, as returned by [`read_frame`](crate::utils::read_frame)
        impl TryFrom<&mut Bytes> for $name {
            type Error = Error;

            fn try_from(bytes: &mut Bytes) -> Result<Self, Self::Error> {
                de::from_bytes(bytes)
            }
        }
    };
}

impl_frame_for!(Request);
impl_frame_for!(Reply);

fn frame(payload: Bytes) -> Result<Bytes, Error> {
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|length| *length <= MAX_FRAME_LENGTH)
        .ok_or_else(|| Error::BadMessage(format!("frame of {} bytes", payload.len())))?;

    let mut bytes = BytesMut::with_capacity(payload.len() + 4);
    bytes.put_u32(length);
    bytes.put_slice(&payload);
    Ok(bytes.freeze())
}
