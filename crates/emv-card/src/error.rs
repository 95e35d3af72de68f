//! Run error taxonomy
//!
//! Only [`Error::Transport`] aborts a run. Every other kind is local: it
//! ends the current directory or application branch and is recorded on the
//! result that branch was filling in.

use emv_common::TlvError;
use thiserror::Error;

use crate::status::StatusWord;
use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("transport fault: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed TLV: {0}")]
    Tlv(#[from] TlvError),

    #[error("malformed AFL: {length} bytes is not a whole number of 4-byte entries")]
    MalformedAfl { length: usize },

    #[error("{command} failed with status {status}")]
    CardStatus {
        command: &'static str,
        status: StatusWord,
    },

    #[error("unexpected {command} response: {detail}")]
    ProtocolMismatch {
        command: &'static str,
        detail: String,
    },
}

impl Error {
    pub const fn card_status(command: &'static str, status: StatusWord) -> Self {
        Self::CardStatus { command, status }
    }

    pub fn protocol_mismatch(command: &'static str, detail: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            command,
            detail: detail.into(),
        }
    }

    /// Whether this error must abort the whole run
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Hand back a local failure for recording, or the transport fault that
    /// must abort the run
    pub fn into_local(self) -> Result<Self, TransportError> {
        match self {
            Self::Transport(fault) => Err(fault),
            local => Ok(local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_fatal() {
        let fault = Error::from(TransportError::Disconnected);
        assert!(fault.is_fatal());
        assert_eq!(fault.into_local(), Err(TransportError::Disconnected));

        let local = Error::card_status("SELECT", StatusWord::new(0x6A, 0x81));
        assert!(!local.is_fatal());
        assert_eq!(local.to_string(), "SELECT failed with status 6A81");
        assert_eq!(local.clone().into_local(), Ok(local));
    }
}
