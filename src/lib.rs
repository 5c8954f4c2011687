//! Control layer of an FTP client session.
//!
//! Callers send commands over a [`ControlChannel`] (or through the stateful
//! [`FtpController`]) and get every outcome back as a [`Reply`]. Protocol
//! work is delegated to an [`FtpClientPort`]; downloads run one at a time on
//! a dedicated transfer worker.

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod buf;
mod channel;
/// Failure classification into reply codes
pub mod classifier;
/// Caller side
pub mod client;
pub mod config;
mod de;
pub mod error;
pub mod port;
/// Wire types
pub mod protocol;
mod ser;
/// Service side
pub mod server;
/// Frame helpers for carrying requests and replies over a byte stream
pub mod utils;

pub use self::{
    channel::{ControlChannel, ReplyReceiver, ReplySender},
    client::FtpController,
    config::Config,
    port::{FtpClientPort, PortError, TransferListener},
    protocol::{Command, ExceptionCode, Reply},
    server::FtpService,
};
