//! Error types shared by the window manager and its display backend.

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::ErrorKind;

use crate::shared::WindowId;

/// Errors raised by display-server operations and registry bookkeeping.
#[derive(Error, Debug)]
pub enum WmError {
    /// Another client already selected substructure redirect on the root.
    #[error("another window manager is already running")]
    AccessDenied,

    /// A client or frame handle was registered twice.
    #[error("window 0x{0:x} is already registered")]
    DuplicateRegistration(WindowId),

    /// The server no longer knows this window.
    #[error("window 0x{0:x} no longer exists")]
    WindowGone(WindowId),

    #[error("unknown color {0:?}")]
    UnknownColor(String),

    #[error("Failed to connect to X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X11 resource allocation failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
}

impl WmError {
    /// Whether the connection itself is unusable. Everything else is a
    /// per-window failure that the event loop logs and survives.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Connection(_) => true,
            Self::Reply(ReplyError::ConnectionError(_)) => true,
            Self::ReplyOrId(ReplyOrIdError::ConnectionError(_) | ReplyOrIdError::IdsExhausted) => true,
            _ => false,
        }
    }

    /// Map a request failure on `window` to `WindowGone` when the server
    /// reports the window (or drawable) as unknown.
    pub fn for_window(window: WindowId, err: ReplyError) -> Self {
        match &err {
            ReplyError::X11Error(e)
                if matches!(e.error_kind, ErrorKind::Window | ErrorKind::Drawable) =>
            {
                Self::WindowGone(window)
            }
            _ => Self::Reply(err),
        }
    }
}

pub type WmResult<T> = Result<T, WmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_window_is_not_fatal() {
        assert!(!WmError::WindowGone(0x400001).is_fatal());
        assert!(!WmError::DuplicateRegistration(7).is_fatal());
        assert!(WmError::Connection(ConnectionError::UnknownError).is_fatal());
    }
}
