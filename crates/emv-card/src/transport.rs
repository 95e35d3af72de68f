//! Command/response transport consumed by the engines
//!
//! A transport exchanges raw APDUs with one card. It knows nothing about
//! EMV: status words, GET RESPONSE chaining and retries are handled by
//! [`CardSession`](crate::session::CardSession).

use thiserror::Error;

use crate::apdu::{ApduCommand, ApduResponse};

/// Fatal transport fault: the card or reader can no longer be talked to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    #[error("response of {0} bytes carries no status word")]
    ShortResponse(usize),

    #[error("command data of {0} bytes does not fit a short APDU")]
    CommandTooLong(usize),

    #[error("card is not connected")]
    Disconnected,

    #[error("{0}")]
    Other(String),
}

/// Synchronous, half-duplex card channel
pub trait CardTransport {
    /// Send one command and block until the card answers
    fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, TransportError>;

    /// Warm reset: reconnect with the same sharing mode, dropping the
    /// currently selected application
    fn reset_session(&mut self) -> Result<(), TransportError>;

    /// Cold reset and return the card's answer-to-reset
    fn cold_reset_atr(&mut self) -> Result<Vec<u8>, TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, TransportError> {
        (**self).transmit(command)
    }

    fn reset_session(&mut self) -> Result<(), TransportError> {
        (**self).reset_session()
    }

    fn cold_reset_atr(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).cold_reset_atr()
    }
}
