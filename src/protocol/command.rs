use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{
    FTP_ABORT, FTP_CD, FTP_CDUP, FTP_CONNECT, FTP_DISCONNECT, FTP_DOWNLOAD, FTP_LIST,
    FTP_LIST_NAMES, FTP_LOGIN, FTP_LOGOUT, FTP_PWD, FTP_START, FTP_STOP,
};

/// Discriminant of a [`Command`], also used as the reply kind for its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Stop,
    Connect,
    Disconnect,
    Login,
    Logout,
    CurrentDirectory,
    ChangeDirectory,
    ChangeDirectoryUp,
    List,
    ListNames,
    Download,
    Abort,
}

impl CommandKind {
    pub(crate) fn what(self) -> u8 {
        match self {
            Self::Start => FTP_START,
            Self::Stop => FTP_STOP,
            Self::Connect => FTP_CONNECT,
            Self::Disconnect => FTP_DISCONNECT,
            Self::Login => FTP_LOGIN,
            Self::Logout => FTP_LOGOUT,
            Self::CurrentDirectory => FTP_PWD,
            Self::ChangeDirectory => FTP_CD,
            Self::ChangeDirectoryUp => FTP_CDUP,
            Self::List => FTP_LIST,
            Self::ListNames => FTP_LIST_NAMES,
            Self::Download => FTP_DOWNLOAD,
            Self::Abort => FTP_ABORT,
        }
    }

    pub(crate) fn from_what(what: u8) -> Option<Self> {
        Some(match what {
            FTP_START => Self::Start,
            FTP_STOP => Self::Stop,
            FTP_CONNECT => Self::Connect,
            FTP_DISCONNECT => Self::Disconnect,
            FTP_LOGIN => Self::Login,
            FTP_LOGOUT => Self::Logout,
            FTP_PWD => Self::CurrentDirectory,
            FTP_CD => Self::ChangeDirectory,
            FTP_CDUP => Self::ChangeDirectoryUp,
            FTP_LIST => Self::List,
            FTP_LIST_NAMES => Self::ListNames,
            FTP_DOWNLOAD => Self::Download,
            FTP_ABORT => Self::Abort,
            _ => return None,
        })
    }
}

/// A control request. Each variant carries only the arguments its command needs;
/// absent optional arguments fall back to the service defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Stop,
    Connect {
        host: String,
        /// `None` uses the port's default
        port: Option<u16>,
    },
    Disconnect,
    Login {
        username: Option<String>,
        password: Option<String>,
    },
    Logout,
    CurrentDirectory,
    ChangeDirectory {
        path: Option<String>,
    },
    ChangeDirectoryUp,
    List {
        file_spec: Option<String>,
    },
    ListNames,
    Download {
        remote_name: String,
        local_path: PathBuf,
        /// Negative offsets are rejected before reaching the transfer worker
        restart_at: i64,
    },
    /// Stops the transfer running at the time ABORT is processed.
    ///
    /// Downloads still waiting in the queue are not affected, including one
    /// queued just before the ABORT whose transfer has not started yet.
    Abort,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Start => CommandKind::Start,
            Self::Stop => CommandKind::Stop,
            Self::Connect { .. } => CommandKind::Connect,
            Self::Disconnect => CommandKind::Disconnect,
            Self::Login { .. } => CommandKind::Login,
            Self::Logout => CommandKind::Logout,
            Self::CurrentDirectory => CommandKind::CurrentDirectory,
            Self::ChangeDirectory { .. } => CommandKind::ChangeDirectory,
            Self::ChangeDirectoryUp => CommandKind::ChangeDirectoryUp,
            Self::List { .. } => CommandKind::List,
            Self::ListNames => CommandKind::ListNames,
            Self::Download { .. } => CommandKind::Download,
            Self::Abort => CommandKind::Abort,
        }
    }

    pub fn connect<T: Into<String>>(host: T, port: Option<u16>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
        }
    }

    pub fn login<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self::Login {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn download<R: Into<String>, L: Into<PathBuf>>(remote_name: R, local_path: L, restart_at: i64) -> Self {
        Self::Download {
            remote_name: remote_name.into(),
            local_path: local_path.into(),
            restart_at,
        }
    }
}
