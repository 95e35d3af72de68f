//! Scripted in-memory card for end-to-end tests.
//!
//! Responses are keyed by the exact command bytes. A command with several
//! scripted responses gets them in order and then keeps the last one;
//! unscripted commands answer `6A82`.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use emv_card::{ApduCommand, ApduResponse, CardTransport, SessionConfig, TransportError};

pub const SELECT_PSE: &str = "00A404000E315041592E5359532E444446303100";
pub const SELECT_PPSE: &str = "00A404000E325041592E5359532E444446303100";
pub const SELECT_VISA: &str = "00A4040007A000000003101000";
pub const SELECT_MASTERCARD: &str = "00A4040007A000000004101000";
pub const GPO_DEFAULT: &str = "80A8000002830000";

pub const VISA: &str = "A0000000031010";
pub const MASTERCARD: &str = "A0000000041010";

pub const ATR: &str = "3B6800000073C84000009000";

pub fn bytes(s: &str) -> Vec<u8> {
    hex::decode(s.replace(' ', "")).unwrap()
}

/// READ RECORD command bytes for `record` in `sfi`
pub fn read_record(sfi: u8, record: u8) -> String {
    format!("00B2{:02X}{:02X}00", record, (sfi << 3) | 4)
}

/// Default configuration, probing only Visa and Mastercard
pub fn config() -> SessionConfig {
    SessionConfig::default().with_reference_aids(vec![bytes(VISA), bytes(MASTERCARD)])
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedCard {
    script: HashMap<Vec<u8>, VecDeque<Vec<u8>>>,
    atr: Vec<u8>,
    /// Commands received, in order
    pub sent: Vec<Vec<u8>>,
    pub resets: usize,
    disconnect_after: Option<usize>,
}

impl ScriptedCard {
    pub fn new() -> Self {
        Self {
            atr: bytes(ATR),
            ..Default::default()
        }
    }

    /// Script the responses (data plus status word, hex) for one command
    pub fn on(mut self, command: &str, responses: &[&str]) -> Self {
        self.script
            .insert(bytes(command), responses.iter().map(|r| bytes(r)).collect());
        self
    }

    /// Fail every command after the first `count` with a transport fault
    pub fn disconnect_after(mut self, count: usize) -> Self {
        self.disconnect_after = Some(count);
        self
    }

    pub fn count(&self, command: &str) -> usize {
        let command = bytes(command);
        self.sent.iter().filter(|sent| **sent == command).count()
    }

    pub fn sent_hex(&self) -> Vec<String> {
        self.sent.iter().map(hex::encode_upper).collect()
    }
}

impl CardTransport for ScriptedCard {
    fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, TransportError> {
        if self.disconnect_after.is_some_and(|limit| self.sent.len() >= limit) {
            return Err(TransportError::Disconnected);
        }

        let apdu = command.build()?;
        let raw = match self.script.get_mut(&apdu) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| vec![0x6A, 0x82]),
            None => vec![0x6A, 0x82],
        };
        self.sent.push(apdu);

        ApduResponse::from_raw(&raw)
    }

    fn reset_session(&mut self) -> Result<(), TransportError> {
        self.resets += 1;
        Ok(())
    }

    fn cold_reset_atr(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.atr.clone())
    }
}
