//! Service side: the control worker and the transfer worker.

mod dispatcher;
mod download;

use std::sync::{atomic::AtomicU32, Arc};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

pub use self::download::{DownloadElement, DownloadQueue, DownloadTickets, TransferActivity};

use self::{dispatcher::Dispatcher, download::DownloadWorker};
use crate::{
    channel::{ControlChannel, Envelope, ReplyReceiver, SessionSink},
    config::Config,
    port::FtpClientPort,
};

/// Handle to a running service.
///
/// Both workers live until a STOP command is processed, [`shutdown`](Self::shutdown)
/// is called or the handle is dropped. Pending commands and queued downloads are
/// discarded at that point, not flushed.
pub struct FtpService {
    tx: mpsc::UnboundedSender<Envelope>,
    next_req_id: Arc<AtomicU32>,
    shutdown: Option<oneshot::Sender<()>>,
    control: JoinHandle<()>,
}

impl FtpService {
    /// Starts both workers around `port`. Must be called within a tokio runtime
    pub fn spawn<P: FtpClientPort>(port: Arc<P>, config: Config) -> Self {
        let session = SessionSink::default();

        let (queue, tickets) = DownloadQueue::new();
        let worker = DownloadWorker::new(port.clone(), queue.clone(), tickets, session.clone());
        let activity = worker.activity();
        let worker = worker.spawn();

        let dispatcher = Dispatcher::new(port, Arc::new(config), session, queue, activity, worker);

        let (tx, inbox) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let control = tokio::spawn(dispatcher.run(inbox, shutdown_rx));

        info!("ftp service started");

        Self {
            tx,
            next_req_id: Arc::new(AtomicU32::new(1)),
            shutdown: Some(shutdown),
            control,
        }
    }

    /// Opens a new raw channel to the service with its own reply stream
    pub fn channel(&self) -> (ControlChannel, ReplyReceiver) {
        ControlChannel::new(self.tx.clone(), self.next_req_id.clone())
    }

    /// Returns `true` once the control worker ended
    pub fn is_finished(&self) -> bool {
        self.control.is_finished()
    }

    /// Tears down both workers and waits for the control worker to end
    pub async fn shutdown(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        let _ = shutdown.send(());

        if let Err(err) = (&mut self.control).await {
            if !err.is_cancelled() {
                error!("control worker failed: {}", err);
            }
        }

        info!("ftp service stopped");
    }
}
