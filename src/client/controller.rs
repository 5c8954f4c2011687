use std::{path::PathBuf, sync::Arc};
use tokio::task::JoinHandle;

use super::{
    error::Error,
    handler::Handler,
    state::{SessionState, SessionStateMachine},
};
use crate::{
    channel::{ControlChannel, ReplyReceiver},
    config::Config,
    port::FtpClientPort,
    protocol::{Command, CommandKind, ExceptionCode, Payload, Reply, ReplyKind},
    server::FtpService,
};

macro_rules! into_wrap {
    ($handler:expr) => {
        if let Err(err) = $handler.await {
            warn!("handler failed: {}", err);
        }
    };
}

/// Stateful facade over a [`FtpService`].
///
/// Every call checks the session state first and fails fast without
/// reaching the service. Replies are handed to the [`Handler`] given to
/// [`start`](Self::start), in the order the service produced them.
pub struct FtpController<P: FtpClientPort> {
    port: Arc<P>,
    config: Config,
    state: Arc<SessionStateMachine>,
    service: Option<FtpService>,
    channel: Option<ControlChannel>,
    pump: Option<JoinHandle<()>>,
}

impl<P: FtpClientPort> FtpController<P> {
    pub fn new(port: Arc<P>, config: Config) -> Self {
        Self {
            port,
            config,
            state: Arc::new(SessionStateMachine::new()),
            service: None,
            channel: None,
            pump: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    /// Spawns the service and sends START. Must be called within a tokio runtime
    pub fn start<H>(&mut self, handler: H) -> Result<u32, Error>
    where
        H: Handler + Send + 'static,
    {
        self.state.check(CommandKind::Start)?;

        // a service left over from a previous session has already seen STOP
        self.service = None;
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }

        let service = FtpService::spawn(self.port.clone(), self.config.clone());
        let (channel, replies) = service.channel();
        self.pump = Some(tokio::spawn(pump(replies, self.state.clone(), handler)));

        let id = channel.send(Command::Start)?;
        self.service = Some(service);
        self.channel = Some(channel);

        Ok(id)
    }

    pub fn stop(&self) -> Result<u32, Error> {
        self.send(Command::Stop)
    }

    /// Connects to `host` on the port's default port
    pub fn connect<T: Into<String>>(&self, host: T) -> Result<u32, Error> {
        self.send(Command::connect(host, None))
    }

    /// Connects to `host`. A negative `port` selects the default
    pub fn connect_with_port<T: Into<String>>(&self, host: T, port: i32) -> Result<u32, Error> {
        let port = match port {
            port if port < 0 => None,
            port => Some(
                u16::try_from(port)
                    .map_err(|_| Error::InvalidArgument(format!("port {port} out of range")))?,
            ),
        };

        self.send(Command::connect(host, port))
    }

    pub fn disconnect(&self) -> Result<u32, Error> {
        self.send(Command::Disconnect)
    }

    /// Logs in with the configured anonymous credentials
    pub fn login(&self) -> Result<u32, Error> {
        self.send(Command::Login {
            username: None,
            password: None,
        })
    }

    pub fn login_with<U, W>(&self, username: U, password: W) -> Result<u32, Error>
    where
        U: Into<String>,
        W: Into<String>,
    {
        self.send(Command::login(username, password))
    }

    pub fn logout(&self) -> Result<u32, Error> {
        self.send(Command::Logout)
    }

    pub fn current_directory(&self) -> Result<u32, Error> {
        self.send(Command::CurrentDirectory)
    }

    /// Changes to `path`, or to the configured root when `None`
    pub fn change_directory(&self, path: Option<String>) -> Result<u32, Error> {
        self.send(Command::ChangeDirectory { path })
    }

    pub fn change_directory_up(&self) -> Result<u32, Error> {
        self.send(Command::ChangeDirectoryUp)
    }

    pub fn list(&self) -> Result<u32, Error> {
        self.send(Command::List { file_spec: None })
    }

    pub fn list_spec<T: Into<String>>(&self, file_spec: T) -> Result<u32, Error> {
        self.send(Command::List {
            file_spec: Some(file_spec.into()),
        })
    }

    pub fn list_names(&self) -> Result<u32, Error> {
        self.send(Command::ListNames)
    }

    /// Queues a download from the beginning of the remote file
    pub fn download<R, L>(&self, remote_name: R, local_path: L) -> Result<u32, Error>
    where
        R: Into<String>,
        L: Into<PathBuf>,
    {
        self.download_from(remote_name, local_path, 0)
    }

    /// Queues a download resuming at `restart_at`
    pub fn download_from<R, L>(
        &self,
        remote_name: R,
        local_path: L,
        restart_at: i64,
    ) -> Result<u32, Error>
    where
        R: Into<String>,
        L: Into<PathBuf>,
    {
        if restart_at < 0 {
            return Err(Error::InvalidArgument(format!(
                "negative restart offset {restart_at}"
            )));
        }

        self.send(Command::download(remote_name, local_path, restart_at))
    }

    /// Aborts the running transfer. With none running this is an OK no-op,
    /// even if a download was queued but has not started yet
    pub fn abort_current_transfer(&self) -> Result<u32, Error> {
        self.send(Command::Abort)
    }

    /// Tears the service down without waiting for a STOP reply
    pub async fn shutdown(&mut self) {
        self.channel = None;
        if let Some(mut service) = self.service.take() {
            service.shutdown().await;
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.state.reset();
    }

    fn send(&self, command: Command) -> Result<u32, Error> {
        self.state.check(command.kind())?;
        self.channel
            .as_ref()
            .ok_or(Error::ChannelClosed)?
            .send(command)
    }
}

impl<P: FtpClientPort> Drop for FtpController<P> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

async fn pump<H>(mut replies: ReplyReceiver, state: Arc<SessionStateMachine>, mut handler: H)
where
    H: Handler + Send,
{
    while let Some(reply) = replies.recv().await {
        let stopped = reply.kind == ReplyKind::Command(CommandKind::Stop);

        state.on_reply(&reply);
        execute_handler(reply, &mut handler).await;

        if stopped {
            break;
        }
    }

    debug!("reply pump ended");
}

async fn execute_handler<H>(reply: Reply, handler: &mut H)
where
    H: Handler + Send,
{
    let Reply {
        id,
        kind,
        code,
        payload,
    } = reply;

    match kind {
        ReplyKind::Command(command) => execute_command(command, id, code, payload, handler).await,
        ReplyKind::DownloadStarted => into_wrap!(handler.download_started(id)),
        ReplyKind::DownloadTransferred => {
            let bytes = match payload {
                Payload::Transferred(bytes) => bytes,
                _ => 0,
            };
            into_wrap!(handler.download_transferred(id, bytes))
        }
        ReplyKind::DownloadCompleted => into_wrap!(handler.download_completed(id)),
        ReplyKind::DownloadAborted => into_wrap!(handler.download_aborted(id)),
        ReplyKind::DownloadFailed => into_wrap!(handler.download_failed(id, code)),
        ReplyKind::QueueDepth => {
            let depth = match payload {
                Payload::QueueDepth(depth) => depth,
                _ => 0,
            };
            into_wrap!(handler.queue_depth(code, depth))
        }
    }
}

async fn execute_command<H>(
    command: CommandKind,
    id: Option<u32>,
    code: ExceptionCode,
    payload: Payload,
    handler: &mut H,
) where
    H: Handler + Send,
{
    match command {
        CommandKind::Start => into_wrap!(handler.started(code)),
        CommandKind::Stop => into_wrap!(handler.stopped(code)),
        CommandKind::Connect => {
            let messages = match payload {
                Payload::Messages(messages) => messages,
                _ => Vec::new(),
            };
            into_wrap!(handler.connected(code, messages))
        }
        CommandKind::Disconnect => into_wrap!(handler.disconnected(code)),
        CommandKind::Login => into_wrap!(handler.logged_in(code)),
        CommandKind::Logout => into_wrap!(handler.logged_out(code)),
        CommandKind::CurrentDirectory => {
            let path = match payload {
                Payload::Path(path) => Some(path),
                _ => None,
            };
            into_wrap!(handler.current_directory(code, path))
        }
        CommandKind::ChangeDirectory => into_wrap!(handler.changed_directory(code)),
        CommandKind::ChangeDirectoryUp => into_wrap!(handler.changed_directory_up(code)),
        CommandKind::List => {
            let files = match payload {
                Payload::Files(files) => files,
                _ => Vec::new(),
            };
            into_wrap!(handler.listed(code, files))
        }
        CommandKind::ListNames => {
            let names = match payload {
                Payload::Names(names) => names,
                _ => Vec::new(),
            };
            into_wrap!(handler.listed_names(code, names))
        }
        CommandKind::Download => match id {
            Some(id) => into_wrap!(handler.downloaded(id, code)),
            None => warn!("download reply without a request id"),
        },
        CommandKind::Abort => into_wrap!(handler.aborted(code)),
    }
}
