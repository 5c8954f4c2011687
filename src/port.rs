//! Capability interface to the FTP client library the service drives.
//!
//! The service never speaks the FTP wire protocol itself. It calls into one
//! [`FtpClientPort`] and turns every [`PortError`] into an
//! [`ExceptionCode`](crate::protocol::ExceptionCode).

use std::{io, path::Path};
use thiserror::Error;

use crate::protocol::FileRecord;

pub type PortResult<T> = Result<T, PortError>;

/// Failure categories an [`FtpClientPort`] may raise
#[derive(Debug, Clone, Error)]
pub enum PortError {
    /// The client was asked to do something its session state forbids
    #[error("Illegal state: {0}")]
    IllegalState(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("I/O: {0}")]
    Io(String),
    /// The server answered with something that is not an FTP reply
    #[error("Illegal reply from server")]
    IllegalReply,
    /// The server rejected a command
    #[error("{code} {message}")]
    Ftp { code: u16, message: String },
    #[error("Data transfer: {0}")]
    DataTransfer(String),
    #[error("Transfer aborted")]
    Aborted,
    #[error("List parse: {0}")]
    ListParse(String),
    /// Anything the adapter could not categorize
    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for PortError {
    fn from(error: io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Progress observer handed to [`FtpClientPort::download`]
pub trait TransferListener: Send + Sync {
    fn started(&self);
    fn transferred(&self, length: u64);
    fn completed(&self);
    fn aborted(&self);
    fn failed(&self);
}

/// FTP client capability. This is `async_trait`.
///
/// All methods take `&self`: the control worker and the transfer worker share
/// one instance, so `download` and `abort_current_transfer` must be able to run
/// concurrently. No other pair of calls is ever issued concurrently.
#[async_trait]
pub trait FtpClientPort: Send + Sync + 'static {
    /// Connects to `host`, on the implementation's default port when `port` is `None`.
    /// Returns the server's welcome lines.
    async fn connect(&self, host: &str, port: Option<u16>) -> PortResult<Vec<String>>;

    async fn disconnect(&self, force: bool) -> PortResult<()>;

    async fn login(&self, username: &str, password: &str) -> PortResult<()>;

    async fn logout(&self) -> PortResult<()>;

    async fn current_directory(&self) -> PortResult<String>;

    async fn change_directory(&self, path: &str) -> PortResult<()>;

    async fn change_directory_up(&self) -> PortResult<()>;

    /// Lists the current directory, filtered by `file_spec` when given
    async fn list(&self, file_spec: Option<&str>) -> PortResult<Vec<FileRecord>>;

    async fn list_names(&self) -> PortResult<Vec<String>>;

    /// Downloads `remote` into `local`, resuming at `restart_at` when it is non-zero.
    /// An aborted transfer must fail with [`PortError::Aborted`].
    async fn download(
        &self,
        remote: &str,
        local: &Path,
        restart_at: u64,
        listener: &dyn TransferListener,
    ) -> PortResult<()>;

    async fn abort_current_transfer(&self, force: bool) -> PortResult<()>;
}
