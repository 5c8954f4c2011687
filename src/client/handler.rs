use std::fmt::Display;

use crate::protocol::{ExceptionCode, FileRecord};

/// Caller-side reply handler. This is `async_trait`
///
/// Every method defaults to a no-op. Errors returned from a callback are
/// logged and do not stop the reply pump.
#[async_trait]
pub trait Handler: Sized {
    type Error: Display + Send;

    /// Called on the START reply.
    #[allow(unused_variables)]
    async fn started(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the STOP reply. No callback follows it.
    #[allow(unused_variables)]
    async fn stopped(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the CONNECT reply with the server banner lines.
    #[allow(unused_variables)]
    async fn connected(
        &mut self,
        code: ExceptionCode,
        messages: Vec<String>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the DISCONNECT reply.
    #[allow(unused_variables)]
    async fn disconnected(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the LOGIN reply.
    #[allow(unused_variables)]
    async fn logged_in(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the LOGOUT reply.
    #[allow(unused_variables)]
    async fn logged_out(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the CURRENT_DIRECTORY reply; `path` is `None` on failure.
    #[allow(unused_variables)]
    async fn current_directory(
        &mut self,
        code: ExceptionCode,
        path: Option<String>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the CHANGE_DIRECTORY reply.
    #[allow(unused_variables)]
    async fn changed_directory(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the CHANGE_DIRECTORY_UP reply.
    #[allow(unused_variables)]
    async fn changed_directory_up(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the LIST reply; `files` is empty on failure.
    #[allow(unused_variables)]
    async fn listed(
        &mut self,
        code: ExceptionCode,
        files: Vec<FileRecord>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the LIST_NAMES reply; `names` is empty on failure.
    #[allow(unused_variables)]
    async fn listed_names(
        &mut self,
        code: ExceptionCode,
        names: Vec<String>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once a queued download finished, with its outcome.
    #[allow(unused_variables)]
    async fn downloaded(&mut self, id: u32, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the ABORT reply.
    #[allow(unused_variables)]
    async fn aborted(&mut self, code: ExceptionCode) -> Result<(), Self::Error> {
        Ok(())
    }

    #[allow(unused_variables)]
    async fn download_started(&mut self, id: Option<u32>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// `bytes` is the running total for the current transfer.
    #[allow(unused_variables)]
    async fn download_transferred(
        &mut self,
        id: Option<u32>,
        bytes: u64,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    #[allow(unused_variables)]
    async fn download_completed(&mut self, id: Option<u32>) -> Result<(), Self::Error> {
        Ok(())
    }

    #[allow(unused_variables)]
    async fn download_aborted(&mut self, id: Option<u32>) -> Result<(), Self::Error> {
        Ok(())
    }

    #[allow(unused_variables)]
    async fn download_failed(
        &mut self,
        id: Option<u32>,
        code: ExceptionCode,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called whenever the download queue depth changes.
    #[allow(unused_variables)]
    async fn queue_depth(&mut self, code: ExceptionCode, depth: u64) -> Result<(), Self::Error> {
        Ok(())
    }
}
