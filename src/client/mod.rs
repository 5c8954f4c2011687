//! Caller side: session state tracking and reply dispatch.

mod controller;
pub mod error;
mod handler;
mod state;

pub use self::{
    controller::FtpController,
    handler::Handler,
    state::{SessionState, SessionStateMachine},
};
