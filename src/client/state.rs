use std::sync::atomic::{AtomicU8, Ordering};

use super::error::Error;
use crate::protocol::{CommandKind, Reply, ReplyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Stopped = 0,
    Started = 1,
    Connected = 2,
    LoggedIn = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Started,
            2 => Self::Connected,
            3 => Self::LoggedIn,
            _ => Self::Stopped,
        }
    }

    /// Returns `true` if `command` may be issued in this state
    pub fn allows(self, command: CommandKind) -> bool {
        use CommandKind as C;

        match self {
            Self::Stopped => command == C::Start,
            Self::Started => matches!(command, C::Connect | C::Stop),
            Self::Connected => !matches!(command, C::Start | C::Connect | C::Logout),
            Self::LoggedIn => !matches!(command, C::Start | C::Connect | C::Login),
        }
    }
}

/// Caller-side mirror of the session state.
///
/// Moves only when a reply confirms a transition, never on the request.
#[derive(Debug)]
pub struct SessionStateMachine {
    state: AtomicU8,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Stopped as u8),
        }
    }

    pub fn current(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Fails fast if `command` is illegal in the current state
    pub fn check(&self, command: CommandKind) -> Result<(), Error> {
        let state = self.current();
        if state.allows(command) {
            Ok(())
        } else {
            warn!("{:?}: incorrect state {:?}", command, state);
            Err(Error::IllegalState { state, command })
        }
    }

    /// Applies the transition confirmed by `reply`, returning the new state if it changed
    pub fn on_reply(&self, reply: &Reply) -> Option<SessionState> {
        let ReplyKind::Command(command) = reply.kind else {
            return None;
        };

        let next = match command {
            CommandKind::Stop => SessionState::Stopped,
            CommandKind::Start => SessionState::Started,
            _ if !reply.is_ok() => return None,
            CommandKind::Connect | CommandKind::Logout => SessionState::Connected,
            CommandKind::Disconnect => SessionState::Started,
            CommandKind::Login => SessionState::LoggedIn,
            _ => return None,
        };

        let previous = SessionState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        if previous == next {
            return None;
        }

        debug!("session {:?} -> {:?}", previous, next);
        Some(next)
    }

    pub(crate) fn reset(&self) {
        self.state.store(SessionState::Stopped as u8, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ExceptionCode, Payload};

    fn reply(kind: CommandKind, code: ExceptionCode) -> Reply {
        Reply::error(1, kind, code)
    }

    #[test]
    fn test_allowed_commands() {
        use CommandKind as C;

        assert!(SessionState::Stopped.allows(C::Start));
        assert!(!SessionState::Stopped.allows(C::Stop));
        assert!(!SessionState::Started.allows(C::Login));
        assert!(!SessionState::Started.allows(C::List));
        assert!(SessionState::Started.allows(C::Connect));
        assert!(SessionState::Connected.allows(C::Login));
        assert!(SessionState::Connected.allows(C::Download));
        assert!(!SessionState::Connected.allows(C::Logout));
        assert!(SessionState::LoggedIn.allows(C::Logout));
        assert!(SessionState::LoggedIn.allows(C::Abort));
        assert!(!SessionState::LoggedIn.allows(C::Login));
        assert!(!SessionState::LoggedIn.allows(C::Start));
    }

    #[test]
    fn test_transitions_follow_replies() {
        let machine = SessionStateMachine::new();
        assert_eq!(machine.current(), SessionState::Stopped);

        machine.on_reply(&reply(CommandKind::Start, ExceptionCode::Ok));
        assert_eq!(machine.current(), SessionState::Started);

        // failed connect leaves the state alone
        machine.on_reply(&reply(CommandKind::Connect, ExceptionCode::Io));
        assert_eq!(machine.current(), SessionState::Started);

        machine.on_reply(&reply(CommandKind::Connect, ExceptionCode::Ok));
        assert_eq!(
            machine.on_reply(&reply(CommandKind::Login, ExceptionCode::Ok)),
            Some(SessionState::LoggedIn)
        );
        assert_eq!(
            machine.on_reply(&reply(CommandKind::ListNames, ExceptionCode::Ok)),
            None
        );

        machine.on_reply(&reply(CommandKind::Logout, ExceptionCode::Ok));
        assert_eq!(machine.current(), SessionState::Connected);

        machine.on_reply(&reply(CommandKind::Disconnect, ExceptionCode::Ok));
        assert_eq!(machine.current(), SessionState::Started);

        machine.on_reply(&reply(CommandKind::Stop, ExceptionCode::Ok));
        assert_eq!(machine.current(), SessionState::Stopped);
    }

    #[test]
    fn test_login_rejected_before_connect() {
        let machine = SessionStateMachine::new();
        machine.on_reply(&Reply::ok(1, CommandKind::Start, Payload::None));

        let err = machine.check(CommandKind::Login).unwrap_err();
        assert_eq!(
            err,
            Error::IllegalState {
                state: SessionState::Started,
                command: CommandKind::Login
            }
        );
        assert_eq!(err.code(), ExceptionCode::IllegalState);
    }

    #[test]
    fn test_events_do_not_move_state() {
        let machine = SessionStateMachine::new();
        let event = Reply::event(
            Some(1),
            ReplyKind::DownloadCompleted,
            ExceptionCode::Ok,
            Payload::None,
        );
        assert_eq!(machine.on_reply(&event), None);
        assert_eq!(machine.current(), SessionState::Stopped);
    }
}
