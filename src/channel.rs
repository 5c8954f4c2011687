//! Transport-agnostic request/reply plumbing between callers and the service.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, PoisonError, RwLock,
};
use tokio::sync::mpsc;

use crate::{
    client::error::Error,
    protocol::{Command, Reply, Request},
};

pub type ReplySender = mpsc::UnboundedSender<Reply>;
pub type ReplyReceiver = mpsc::UnboundedReceiver<Reply>;

/// A request together with the route its replies take back
#[derive(Debug)]
pub(crate) struct Envelope {
    pub request: Request,
    pub reply_to: ReplySender,
}

/// Raw access to a running service.
///
/// Performs no session state checks: every command is delivered to the
/// dispatcher and answered through the paired [`ReplyReceiver`].
#[derive(Debug, Clone)]
pub struct ControlChannel {
    tx: mpsc::UnboundedSender<Envelope>,
    reply_to: ReplySender,
    next_req_id: Arc<AtomicU32>,
}

impl ControlChannel {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Envelope>,
        next_req_id: Arc<AtomicU32>,
    ) -> (Self, ReplyReceiver) {
        let (reply_to, replies) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                reply_to,
                next_req_id,
            },
            replies,
        )
    }

    /// Queues `command` for the dispatcher and returns its correlation id
    pub fn send(&self, command: Command) -> Result<u32, Error> {
        let id = self.next_req_id.fetch_add(1, Ordering::SeqCst);
        let request = Request { id, command };
        debug!("request {} {:?}", id, request.command);

        self.tx
            .send(Envelope {
                request,
                reply_to: self.reply_to.clone(),
            })
            .map_err(|_| Error::ChannelClosed)?;

        Ok(id)
    }

    /// Returns `true` once the service stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Delivers a reply, dropping it if the caller went away
pub(crate) fn deliver(reply_to: &ReplySender, reply: Reply) {
    if let Err(err) = reply_to.send(reply) {
        debug!("reply {:?} dropped: receiver closed", err.0.kind);
    }
}

/// Reply route of the session registered by START
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionSink {
    inner: Arc<RwLock<Option<ReplySender>>>,
}

impl SessionSink {
    pub fn register(&self, reply_to: ReplySender) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(reply_to);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn send(&self, reply: Reply) {
        match self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(reply_to) => deliver(reply_to, reply),
            None => warn!("no session registered, dropping {:?}", reply.kind),
        }
    }
}
