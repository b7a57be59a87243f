use thiserror::Error;
use tracing::warn;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};

/// Failure to deliver a request to the windowing system
///
/// The client core never retries these. Local state is updated before the
/// request goes out, and the event loop reconciles once the server reports
/// an unmap or destroy.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to the X server failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X server rejected the request: {0}")]
    Reply(#[from] ReplyError),

    #[error("could not allocate an X resource id: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("window 0x{0:x} is not known to the transport")]
    UnknownWindow(u32),

    #[error("display has no screen {0}")]
    NoScreen(usize),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;

/// Log a warning for non-critical errors
pub fn log_warn<T, E: std::fmt::Display>(
    result: std::result::Result<T, E>,
    operation: &str,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Warning in {}: {}", operation, e);
            None
        }
    }
}
