//! EMV Card - Smart card reading and EMV protocol implementation
//!
//! This crate discovers the payment applications on an EMV card and reads
//! them through the standard initiation sequence, over PC/SC readers or any
//! other [`CardTransport`].

pub mod afl;
pub mod aids;
pub mod apdu;
pub mod config;
pub mod discovery;
mod error;
pub mod pdol;
pub mod processing;
pub mod protocol;
pub mod reader;
pub mod report;
pub mod session;
pub mod status;
pub mod transport;

pub use afl::AflEntry;
pub use apdu::{ApduCommand, ApduResponse};
pub use config::{SessionConfig, TerminalData, UnpredictableNumber};
pub use discovery::{Candidate, CandidateSource, Directory, Discovery, DiscoveryResult};
pub use error::Error;
pub use processing::{AefRecord, ApplicationRecord};
pub use protocol::EmvCard;
pub use reader::{CardReader, PcscTransport};
pub use report::{CardReport, DecodedBuffer};
pub use session::CardSession;
pub use status::{StatusOutcome, StatusWord};
pub use transport::{CardTransport, TransportError};

/// Re-export commonly used types
pub use pcsc::{Card, Context, Error as PcscError};
