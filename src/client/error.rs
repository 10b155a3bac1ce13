// ABOUTME: SMPP session error types returned by every public operation
// ABOUTME: Callers branch on the variant to decide whether a retry or a re-bind is needed

use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::datatypes::{CommandId, CommandStatus};
use std::io;
use thiserror::Error;

/// Error type for SMPP session operations
///
/// Exactly one of these is returned for a failed operation. `MaxWindowSize`
/// and `Timeout` are transient; `NotConnected` needs a new session.
#[derive(Debug, Error)]
pub enum SmppError {
    /// The session is not bound, or was closed while the operation was in flight
    #[error("Not connected")]
    NotConnected,

    /// Every window slot is in use; the request was not sent
    #[error("Max window size reached")]
    MaxWindowSize,

    /// No matching response arrived before the deadline
    #[error("Response timeout")]
    Timeout,

    /// The SMSC answered with a non-zero command_status
    #[error("Protocol error: {0}")]
    Protocol(CommandStatus),

    /// Socket read or write failure; the session is torn down
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// A response arrived but could not be decoded, or a PDU could not be encoded
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// Data validation error (invalid message length, too many parts, etc.)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation not permitted for the bind type or session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// The SMSC answered with the wrong response type for the request
    #[error("Unexpected PDU: expected {expected:?}, got {actual:?}")]
    UnexpectedPdu {
        expected: CommandId,
        actual: CommandId,
    },
}

impl SmppError {
    /// True for errors a caller may retry on the same session
    pub fn is_retryable(&self) -> bool {
        matches!(self, SmppError::MaxWindowSize | SmppError::Timeout)
    }

    /// The SMSC status code, for protocol errors
    pub fn command_status(&self) -> Option<CommandStatus> {
        match self {
            SmppError::Protocol(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<ConnectionError> for SmppError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Closed => SmppError::NotConnected,
            ConnectionError::Reset => SmppError::Transport(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            ConnectionError::InvalidLength(length) => SmppError::Transport(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid command_length {length}"),
            )),
            ConnectionError::Io(e) => SmppError::Transport(e),
            ConnectionError::Encode(e) => SmppError::Decode(e),
            ConnectionError::Decode { source, .. } => SmppError::Decode(source),
        }
    }
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(SmppError::MaxWindowSize.is_retryable());
        assert!(SmppError::Timeout.is_retryable());
        assert!(!SmppError::NotConnected.is_retryable());
        assert!(!SmppError::Protocol(CommandStatus::ThrottlingError).is_retryable());
    }

    #[test]
    fn protocol_error_carries_code() {
        let err = SmppError::Protocol(CommandStatus::Other(0x0000_0401));
        assert_eq!(err.command_status().map(|s| s.code()), Some(0x401));
        assert_eq!(SmppError::Timeout.command_status(), None);
    }

    #[test]
    fn connection_errors_map_to_kinds() {
        assert!(matches!(
            SmppError::from(ConnectionError::Closed),
            SmppError::NotConnected
        ));
        assert!(matches!(
            SmppError::from(ConnectionError::Reset),
            SmppError::Transport(_)
        ));
    }
}
