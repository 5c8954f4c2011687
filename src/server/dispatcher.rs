use std::{ops::ControlFlow, path::PathBuf, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use super::download::{DownloadElement, DownloadQueue, TransferActivity};
use crate::{
    channel::{deliver, Envelope, ReplySender, SessionSink},
    classifier::classify,
    config::Config,
    port::FtpClientPort,
    protocol::{Command, CommandKind, ExceptionCode, Payload, Reply, ReplyKind},
};

macro_rules! into_reply {
    ($id:expr, $kind:ident, $call:expr) => {
        into_reply!($id, $kind, $call, |()| Payload::None)
    };
    ($id:expr, $kind:ident, $call:expr, $payload:expr) => {
        match $call.await {
            Ok(value) => Reply::ok($id, CommandKind::$kind, ($payload)(value)),
            Err(err) => {
                error!("{:?}: failed", CommandKind::$kind);
                Reply::error($id, CommandKind::$kind, classify(&err))
            }
        }
    };
}

/// Aborts the transfer worker when the dispatcher goes away
struct WorkerGuard(JoinHandle<()>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The control worker: executes commands one at a time against the port
pub(crate) struct Dispatcher<P> {
    port: Arc<P>,
    config: Arc<Config>,
    session: SessionSink,
    queue: DownloadQueue,
    activity: TransferActivity,
    worker: WorkerGuard,
}

impl<P: FtpClientPort> Dispatcher<P> {
    pub fn new(
        port: Arc<P>,
        config: Arc<Config>,
        session: SessionSink,
        queue: DownloadQueue,
        activity: TransferActivity,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            port,
            config,
            session,
            queue,
            activity,
            worker: WorkerGuard(worker),
        }
    }

    pub async fn run(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<Envelope>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("shutdown requested");
                    break;
                }
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => {
                        if self.process(envelope).await.is_break() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        self.teardown().await;
        debug!("control worker ended");
    }

    async fn process(&mut self, envelope: Envelope) -> ControlFlow<()> {
        let Envelope { request, reply_to } = envelope;
        let id = request.id;
        debug!("process {} {:?}", id, request.command.kind());

        let reply = match request.command {
            Command::Start => {
                self.session.register(reply_to.clone());
                Reply::ok(id, CommandKind::Start, Payload::None)
            }
            Command::Stop => {
                deliver(&reply_to, Reply::ok(id, CommandKind::Stop, Payload::None));
                return ControlFlow::Break(());
            }
            Command::Connect { host, port } => {
                if host.is_empty() {
                    warn!("connect: no host given");
                    Reply::error(id, CommandKind::Connect, ExceptionCode::IllegalState)
                } else {
                    debug!("connect to {}:{:?}", host, port);
                    into_reply!(id, Connect, self.port.connect(&host, port), Payload::Messages)
                }
            }
            Command::Disconnect => into_reply!(
                id,
                Disconnect,
                self.port.disconnect(self.config.force_disconnect)
            ),
            Command::Login { username, password } => {
                let username = username.unwrap_or_else(|| self.config.anonymous_user.clone());
                let password = password.unwrap_or_else(|| self.config.anonymous_password.clone());
                debug!("login as {}", username);
                into_reply!(id, Login, self.port.login(&username, &password))
            }
            Command::Logout => into_reply!(id, Logout, self.port.logout()),
            Command::CurrentDirectory => into_reply!(
                id,
                CurrentDirectory,
                self.port.current_directory(),
                Payload::Path
            ),
            Command::ChangeDirectory { path } => {
                let path = path.unwrap_or_else(|| self.config.root_directory.clone());
                debug!("change directory to {}", path);
                into_reply!(id, ChangeDirectory, self.port.change_directory(&path))
            }
            Command::ChangeDirectoryUp => {
                into_reply!(id, ChangeDirectoryUp, self.port.change_directory_up())
            }
            Command::List { file_spec } => into_reply!(
                id,
                List,
                self.port.list(file_spec.as_deref()),
                Payload::Files
            ),
            Command::ListNames => into_reply!(id, ListNames, self.port.list_names(), Payload::Names),
            Command::Download {
                remote_name,
                local_path,
                restart_at,
            } => match self.enqueue(id, remote_name, local_path, restart_at, &reply_to) {
                Some(reply) => reply,
                None => return ControlFlow::Continue(()),
            },
            Command::Abort => {
                if self.activity.is_active() {
                    into_reply!(
                        id,
                        Abort,
                        self.port.abort_current_transfer(self.config.force_abort)
                    )
                } else {
                    debug!("abort: no transfer in flight");
                    Reply::ok(id, CommandKind::Abort, Payload::None)
                }
            }
        };

        deliver(&reply_to, reply);
        ControlFlow::Continue(())
    }

    /// Queues a download. Returns a reply only when the request is rejected,
    /// otherwise the reply is deferred until the transfer ends.
    fn enqueue(
        &self,
        id: u32,
        remote_name: String,
        local_path: PathBuf,
        restart_at: i64,
        reply_to: &ReplySender,
    ) -> Option<Reply> {
        let restart_at = match u64::try_from(restart_at) {
            Ok(offset) if !remote_name.is_empty() && !local_path.as_os_str().is_empty() => offset,
            _ => {
                warn!(
                    "download: rejected {:?} -> {} at {}",
                    remote_name,
                    local_path.display(),
                    restart_at
                );
                return Some(Reply::error(
                    id,
                    CommandKind::Download,
                    ExceptionCode::FileNotFound,
                ));
            }
        };

        let element = DownloadElement::new(remote_name, local_path, restart_at, id, reply_to.clone());
        let depth = self.queue.push(element);

        deliver(
            reply_to,
            Reply::event(
                Some(id),
                ReplyKind::QueueDepth,
                ExceptionCode::Ok,
                Payload::QueueDepth(depth as u64),
            ),
        );
        self.queue.schedule();

        None
    }

    async fn teardown(&mut self) {
        self.session.clear();

        let discarded = self.queue.clear();
        if discarded > 0 {
            info!("discarding {} queued downloads", discarded);
        }

        if self.activity.is_active() {
            if let Err(err) = self.port.abort_current_transfer(true).await {
                warn!("teardown: abort failed: {}", err);
            }
        }

        self.worker.0.abort();
    }
}
