//! Serialized download queue and the worker that drains it.
//!
//! The dispatcher pushes a [`DownloadElement`], reports the new depth and then
//! [schedules](DownloadQueue::schedule) the worker with one ticket. The worker
//! pops one element per ticket, so at most one transfer runs at a time.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    channel::{deliver, ReplySender, SessionSink},
    classifier::classify,
    port::{FtpClientPort, TransferListener},
    protocol::{CommandKind, ExceptionCode, Payload, Reply, ReplyKind},
};

/// A pending transfer. Destroyed after one attempt, never retried
#[derive(Debug)]
pub struct DownloadElement {
    pub remote_name: String,
    pub local_path: PathBuf,
    pub restart_at: u64,
    id: u32,
    reply_to: ReplySender,
}

impl DownloadElement {
    /// `id` and `reply_to` route the lifecycle events and the deferred reply
    pub fn new<R: Into<String>, L: Into<PathBuf>>(
        remote_name: R,
        local_path: L,
        restart_at: u64,
        id: u32,
        reply_to: ReplySender,
    ) -> Self {
        Self {
            remote_name: remote_name.into(),
            local_path: local_path.into(),
            restart_at,
            id,
            reply_to,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

/// FIFO of pending transfers, shared between the dispatcher and the worker
#[derive(Debug, Clone)]
pub struct DownloadQueue {
    elements: Arc<Mutex<VecDeque<DownloadElement>>>,
    tickets: mpsc::UnboundedSender<()>,
}

/// Wake-ups for the worker, one per scheduled element
#[derive(Debug)]
pub struct DownloadTickets(mpsc::UnboundedReceiver<()>);

impl DownloadQueue {
    pub fn new() -> (Self, DownloadTickets) {
        let (tickets, rx) = mpsc::unbounded_channel();
        (
            Self {
                elements: Arc::new(Mutex::new(VecDeque::new())),
                tickets,
            },
            DownloadTickets(rx),
        )
    }

    fn elements(&self) -> MutexGuard<'_, VecDeque<DownloadElement>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an element and returns the new depth
    pub fn push(&self, element: DownloadElement) -> usize {
        let mut elements = self.elements();
        elements.push_back(element);
        elements.len()
    }

    pub fn pop(&self) -> Option<DownloadElement> {
        self.elements().pop_front()
    }

    /// Wakes the worker for one element
    pub fn schedule(&self) {
        if self.tickets.send(()).is_err() {
            warn!("transfer worker is gone, nothing will be downloaded");
        }
    }

    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    /// Discards every pending element, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut elements = self.elements();
        let len = elements.len();
        elements.clear();
        len
    }
}

/// Tells whether a transfer is currently running
#[derive(Debug, Clone, Default)]
pub struct TransferActivity(Arc<AtomicBool>);

impl TransferActivity {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }
}

/// Relays port callbacks as events, enforcing one STARTED and one terminal event
struct TransferRelay<'a> {
    id: u32,
    reply_to: &'a ReplySender,
    started: AtomicBool,
    finished: AtomicBool,
    bytes: AtomicU64,
}

impl<'a> TransferRelay<'a> {
    fn new(id: u32, reply_to: &'a ReplySender) -> Self {
        Self {
            id,
            reply_to,
            started: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            bytes: AtomicU64::new(0),
        }
    }

    fn emit(&self, kind: ReplyKind, payload: Payload) {
        deliver(
            self.reply_to,
            Reply::event(Some(self.id), kind, ExceptionCode::Ok, payload),
        );
    }

    fn finish(&self, kind: ReplyKind) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        self.emit(kind, Payload::None);
    }
}

impl TransferListener for TransferRelay<'_> {
    fn started(&self) {
        if self.finished.load(Ordering::SeqCst) || self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.emit(ReplyKind::DownloadStarted, Payload::None);
    }

    fn transferred(&self, length: u64) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        let total = self.bytes.fetch_add(length, Ordering::SeqCst) + length;
        self.emit(ReplyKind::DownloadTransferred, Payload::Transferred(total));
    }

    fn completed(&self) {
        self.finish(ReplyKind::DownloadCompleted);
    }

    fn aborted(&self) {
        self.finish(ReplyKind::DownloadAborted);
    }

    fn failed(&self) {
        self.finish(ReplyKind::DownloadFailed);
    }
}

/// Single consumer of a [`DownloadQueue`]
pub struct DownloadWorker<P> {
    port: Arc<P>,
    queue: DownloadQueue,
    tickets: DownloadTickets,
    session: SessionSink,
    activity: TransferActivity,
}

impl<P: FtpClientPort> DownloadWorker<P> {
    pub(crate) fn new(
        port: Arc<P>,
        queue: DownloadQueue,
        tickets: DownloadTickets,
        session: SessionSink,
    ) -> Self {
        Self {
            port,
            queue,
            tickets,
            session,
            activity: TransferActivity::default(),
        }
    }

    pub fn activity(&self) -> TransferActivity {
        self.activity.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while self.tickets.0.recv().await.is_some() {
            self.step().await;
        }

        debug!("transfer worker ended");
    }

    async fn step(&mut self) {
        let Some(element) = self.queue.pop() else {
            warn!("download: no file enqueued for download");
            self.session.send(Reply::event(
                None,
                ReplyKind::DownloadFailed,
                ExceptionCode::Unknown,
                Payload::None,
            ));
            self.session.send(Reply::event(
                None,
                ReplyKind::QueueDepth,
                ExceptionCode::Unknown,
                Payload::QueueDepth(self.queue.len() as u64),
            ));
            return;
        };

        debug!(
            "download {} -> {} at {}",
            element.remote_name,
            element.local_path.display(),
            element.restart_at
        );

        let relay = TransferRelay::new(element.id, &element.reply_to);

        self.activity.set(true);
        let result = self
            .port
            .download(
                &element.remote_name,
                &element.local_path,
                element.restart_at,
                &relay,
            )
            .await;
        self.activity.set(false);

        let code = match result {
            Ok(()) => {
                relay.finish(ReplyKind::DownloadCompleted);
                ExceptionCode::Ok
            }
            Err(err) => {
                error!(
                    "download: failed to download {} to {} from {}",
                    element.remote_name,
                    element.local_path.display(),
                    element.restart_at
                );
                let code = classify(&err);
                relay.finish(if code == ExceptionCode::TransferAborted {
                    ReplyKind::DownloadAborted
                } else {
                    ReplyKind::DownloadFailed
                });
                code
            }
        };

        deliver(
            &element.reply_to,
            Reply::event(
                Some(element.id),
                CommandKind::Download.into(),
                code,
                Payload::None,
            ),
        );
        deliver(
            &element.reply_to,
            Reply::event(
                Some(element.id),
                ReplyKind::QueueDepth,
                code,
                Payload::QueueDepth(self.queue.len() as u64),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex as StdMutex};

    use super::*;
    use crate::{
        channel::ReplyReceiver,
        port::{PortError, PortResult},
        protocol::FileRecord,
    };

    #[derive(Default)]
    struct RecordingPort {
        downloads: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl FtpClientPort for RecordingPort {
        async fn connect(&self, _host: &str, _port: Option<u16>) -> PortResult<Vec<String>> {
            Err(PortError::Other("not scripted".to_owned()))
        }

        async fn disconnect(&self, _force: bool) -> PortResult<()> {
            Ok(())
        }

        async fn login(&self, _username: &str, _password: &str) -> PortResult<()> {
            Ok(())
        }

        async fn logout(&self) -> PortResult<()> {
            Ok(())
        }

        async fn current_directory(&self) -> PortResult<String> {
            Ok("/".to_owned())
        }

        async fn change_directory(&self, _path: &str) -> PortResult<()> {
            Ok(())
        }

        async fn change_directory_up(&self) -> PortResult<()> {
            Ok(())
        }

        async fn list(&self, _file_spec: Option<&str>) -> PortResult<Vec<FileRecord>> {
            Ok(Vec::new())
        }

        async fn list_names(&self) -> PortResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn download(
            &self,
            remote: &str,
            _local: &Path,
            _restart_at: u64,
            listener: &dyn TransferListener,
        ) -> PortResult<()> {
            self.downloads.lock().unwrap().push(remote.to_owned());
            if remote == "missing" {
                listener.failed();
                return Err(PortError::FileNotFound(remote.to_owned()));
            }

            listener.started();
            listener.transferred(10);
            listener.transferred(5);
            listener.completed();
            Ok(())
        }

        async fn abort_current_transfer(&self, _force: bool) -> PortResult<()> {
            Ok(())
        }
    }

    fn element(remote: &str, id: u32, reply_to: &ReplySender) -> DownloadElement {
        DownloadElement::new(remote, format!("/tmp/{remote}"), 0, id, reply_to.clone())
    }

    async fn collect(replies: &mut ReplyReceiver, count: usize) -> Vec<Reply> {
        let mut collected = Vec::with_capacity(count);
        for _ in 0..count {
            let reply = tokio::time::timeout(std::time::Duration::from_secs(5), replies.recv())
                .await
                .expect("timed out waiting for a reply")
                .expect("reply channel closed");
            collected.push(reply);
        }
        collected
    }

    fn depth(reply: &Reply) -> u64 {
        match reply.payload {
            Payload::QueueDepth(depth) => depth,
            ref payload => panic!("expected a queue depth, got {payload:?}"),
        }
    }

    #[tokio::test]
    async fn test_downloads_run_in_order() {
        let port = Arc::new(RecordingPort::default());
        let (queue, tickets) = DownloadQueue::new();
        let (reply_to, mut replies) = mpsc::unbounded_channel();

        for (id, remote) in ["a", "b", "c"].into_iter().enumerate() {
            let depth = queue.push(element(remote, id as u32 + 1, &reply_to));
            assert_eq!(depth, id + 1);
            queue.schedule();
        }

        let worker = DownloadWorker::new(port.clone(), queue.clone(), tickets, SessionSink::default());
        let activity = worker.activity();
        let handle = worker.spawn();

        // STARTED, TRANSFERRED x2, COMPLETED, deferred reply, QUEUE_DEPTH per element
        let replies = collect(&mut replies, 18).await;

        for (index, chunk) in replies.chunks(6).enumerate() {
            let id = Some(index as u32 + 1);
            assert!(chunk.iter().all(|reply| reply.id == id));

            let kinds: Vec<_> = chunk.iter().map(|reply| reply.kind).collect();
            assert_eq!(
                kinds,
                [
                    ReplyKind::DownloadStarted,
                    ReplyKind::DownloadTransferred,
                    ReplyKind::DownloadTransferred,
                    ReplyKind::DownloadCompleted,
                    ReplyKind::Command(CommandKind::Download),
                    ReplyKind::QueueDepth,
                ]
            );
            assert_eq!(chunk[2].payload, Payload::Transferred(15));
            assert!(chunk[4].is_ok());
            assert_eq!(depth(&chunk[5]), 2 - index as u64);
        }

        assert_eq!(*port.downloads.lock().unwrap(), ["a", "b", "c"]);
        assert!(queue.is_empty());
        assert!(!activity.is_active());

        handle.abort();
    }

    #[tokio::test]
    async fn test_failed_download_reports_code() {
        let port = Arc::new(RecordingPort::default());
        let (queue, tickets) = DownloadQueue::new();
        let (reply_to, mut replies) = mpsc::unbounded_channel();

        queue.push(element("missing", 7, &reply_to));
        queue.schedule();
        let handle = DownloadWorker::new(port, queue, tickets, SessionSink::default()).spawn();

        let replies = collect(&mut replies, 3).await;
        assert_eq!(replies[0].kind, ReplyKind::DownloadFailed);
        assert_eq!(replies[1].kind, ReplyKind::Command(CommandKind::Download));
        assert_eq!(replies[1].code, ExceptionCode::FileNotFound);
        assert_eq!(replies[2].kind, ReplyKind::QueueDepth);
        assert_eq!(replies[2].code, ExceptionCode::FileNotFound);
        assert_eq!(depth(&replies[2]), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_wake_on_empty_queue() {
        let port = Arc::new(RecordingPort::default());
        let (queue, tickets) = DownloadQueue::new();
        let session = SessionSink::default();
        let (reply_to, mut replies) = mpsc::unbounded_channel();
        session.register(reply_to);

        queue.schedule();
        let handle = DownloadWorker::new(port.clone(), queue, tickets, session).spawn();

        let replies = collect(&mut replies, 2).await;
        assert_eq!(replies[0].kind, ReplyKind::DownloadFailed);
        assert_eq!(replies[0].code, ExceptionCode::Unknown);
        assert_eq!(replies[0].id, None);
        assert_eq!(replies[1].kind, ReplyKind::QueueDepth);
        assert_eq!(replies[1].code, ExceptionCode::Unknown);
        assert_eq!(depth(&replies[1]), 0);
        assert!(port.downloads.lock().unwrap().is_empty());

        handle.abort();
    }

    #[test]
    fn test_relay_emits_one_terminal_event() {
        let (reply_to, mut replies) = mpsc::unbounded_channel();
        let relay = TransferRelay::new(3, &reply_to);

        relay.started();
        relay.started();
        relay.aborted();
        relay.failed();
        relay.finish(ReplyKind::DownloadFailed);
        relay.transferred(100);

        let mut kinds = Vec::new();
        while let Ok(reply) = replies.try_recv() {
            kinds.push(reply.kind);
        }
        assert_eq!(
            kinds,
            [ReplyKind::DownloadStarted, ReplyKind::DownloadAborted]
        );
    }

    #[test]
    fn test_clear_discards_pending() {
        let (queue, _tickets) = DownloadQueue::new();
        let (reply_to, _replies) = mpsc::unbounded_channel();

        queue.push(element("a", 1, &reply_to));
        queue.push(element("b", 2, &reply_to));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.clear(), 2);
        assert!(queue.pop().is_none());
    }
}
