use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    CommandKind, ExceptionCode, FileRecord, FTP_DOWNLOAD_ABORTED, FTP_DOWNLOAD_COMPLETED,
    FTP_DOWNLOAD_FAILED, FTP_DOWNLOAD_QUEUE, FTP_DOWNLOAD_STARTED, FTP_DOWNLOAD_TRANSFERRED,
    FTP_EVENT_MIN,
};

/// What a [`Reply`] answers: a command, or one of the download lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    Command(CommandKind),
    DownloadStarted,
    DownloadTransferred,
    DownloadCompleted,
    DownloadAborted,
    DownloadFailed,
    QueueDepth,
}

impl ReplyKind {
    pub fn what(self) -> u8 {
        match self {
            Self::Command(kind) => kind.what(),
            Self::DownloadStarted => FTP_DOWNLOAD_STARTED,
            Self::DownloadTransferred => FTP_DOWNLOAD_TRANSFERRED,
            Self::DownloadCompleted => FTP_DOWNLOAD_COMPLETED,
            Self::DownloadAborted => FTP_DOWNLOAD_ABORTED,
            Self::DownloadFailed => FTP_DOWNLOAD_FAILED,
            Self::QueueDepth => FTP_DOWNLOAD_QUEUE,
        }
    }

    pub fn from_what(what: u8) -> Option<Self> {
        Some(match what {
            FTP_DOWNLOAD_STARTED => Self::DownloadStarted,
            FTP_DOWNLOAD_TRANSFERRED => Self::DownloadTransferred,
            FTP_DOWNLOAD_COMPLETED => Self::DownloadCompleted,
            FTP_DOWNLOAD_ABORTED => Self::DownloadAborted,
            FTP_DOWNLOAD_FAILED => Self::DownloadFailed,
            FTP_DOWNLOAD_QUEUE => Self::QueueDepth,
            what => Self::Command(CommandKind::from_what(what)?),
        })
    }

    /// Returns `true` for out-of-band download lifecycle events
    pub fn is_event(self) -> bool {
        self.what() >= FTP_EVENT_MIN
    }

    /// Returns `true` for the events that end a transfer
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DownloadCompleted | Self::DownloadAborted | Self::DownloadFailed
        )
    }
}

impl From<CommandKind> for ReplyKind {
    fn from(kind: CommandKind) -> Self {
        Self::Command(kind)
    }
}

impl Serialize for ReplyKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.what())
    }
}

impl<'de> Deserialize<'de> for ReplyKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let what = u8::deserialize(deserializer)?;
        Self::from_what(what)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown reply kind {what}")))
    }
}

/// Reply body. Which variant accompanies which kind is fixed:
/// `Messages` for CONNECT, `Path` for PWD, `Files` for LIST,
/// `Names` for LIST_NAMES, `Transferred` and `QueueDepth` for their events.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    Messages(Vec<String>),
    Path(String),
    Files(Vec<FileRecord>),
    Names(Vec<String>),
    Transferred(u64),
    QueueDepth(u64),
}

/// Answer to a command or an out-of-band download event.
///
/// `id` correlates the reply with the request that caused it. It is `None`
/// only for events no request can be blamed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Option<u32>,
    pub kind: ReplyKind,
    pub code: ExceptionCode,
    pub payload: Payload,
}

impl Reply {
    pub fn ok<K: Into<ReplyKind>>(id: u32, kind: K, payload: Payload) -> Self {
        Self {
            id: Some(id),
            kind: kind.into(),
            code: ExceptionCode::Ok,
            payload,
        }
    }

    /// Failed reply. Failures never carry a payload
    pub fn error<K: Into<ReplyKind>>(id: u32, kind: K, code: ExceptionCode) -> Self {
        Self {
            id: Some(id),
            kind: kind.into(),
            code,
            payload: Payload::None,
        }
    }

    pub fn event(id: Option<u32>, kind: ReplyKind, code: ExceptionCode, payload: Payload) -> Self {
        Self {
            id,
            kind,
            code,
            payload,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}
