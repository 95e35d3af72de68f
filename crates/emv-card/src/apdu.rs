//! APDU (Application Protocol Data Unit) command handling

use crate::status::{StatusOutcome, StatusWord};
use crate::transport::TransportError;

/// APDU response containing data and status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    pub fn new(data: Vec<u8>, sw1: u8, sw2: u8) -> Self {
        Self { data, sw1, sw2 }
    }

    /// Split a raw response buffer into data and the trailing status word
    pub fn from_raw(rapdu: &[u8]) -> Result<Self, TransportError> {
        if rapdu.len() < 2 {
            return Err(TransportError::ShortResponse(rapdu.len()));
        }

        let sw1 = rapdu[rapdu.len() - 2];
        let sw2 = rapdu[rapdu.len() - 1];
        let data = rapdu[..rapdu.len() - 2].to_vec();

        Ok(Self { data, sw1, sw2 })
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    pub fn status(&self) -> StatusWord {
        StatusWord::new(self.sw1, self.sw2)
    }

    /// Semantic outcome of the status word
    pub fn outcome(&self) -> StatusOutcome {
        StatusOutcome::classify(self.sw1, self.sw2)
    }

    /// Get the full status word as a 16-bit value
    pub fn status_word(&self) -> u16 {
        self.status().to_u16()
    }

    /// Get status word as hex string (e.g., "9000")
    pub fn status_string(&self) -> String {
        self.status().to_string()
    }
}

/// APDU command builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    pub le: Option<u8>,
}

impl ApduCommand {
    /// Create a new APDU command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Set command data
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Set expected response length
    pub fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Short name of the instruction, for logs and errors
    pub fn name(&self) -> &'static str {
        match (self.cla, self.ins) {
            (_, 0xA4) => "SELECT",
            (_, 0xC0) => "GET RESPONSE",
            (_, 0xB2) => "READ RECORD",
            (0x80, 0xA8) => "GET PROCESSING OPTIONS",
            (_, 0xCA) => "GET DATA",
            _ => "APDU",
        }
    }

    /// Build the short APDU command bytes; data longer than one Lc byte
    /// can carry is refused
    pub fn build(&self) -> Result<Vec<u8>, TransportError> {
        let mut apdu = vec![self.cla, self.ins, self.p1, self.p2];

        if !self.data.is_empty() {
            let lc = u8::try_from(self.data.len())
                .map_err(|_| TransportError::CommandTooLong(self.data.len()))?;
            apdu.push(lc);
            apdu.extend_from_slice(&self.data);
        }

        if let Some(le) = self.le {
            apdu.push(le);
        }

        Ok(apdu)
    }
}

/// Common EMV APDU commands
pub mod commands {
    use emv_common::convert::read_record_p2;

    use super::ApduCommand;

    /// SELECT command (by name/AID)
    pub fn select(aid: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, 0xA4, 0x04, 0x00)
            .data(aid.to_vec())
            .le(0x00)
    }

    /// GET RESPONSE command, fetching `le` bytes announced by SW 61xx
    pub fn get_response(le: u8) -> ApduCommand {
        ApduCommand::new(0x00, 0xC0, 0x00, 0x00).le(le)
    }

    /// GET PROCESSING OPTIONS command
    pub fn get_processing_options(pdol_data: Vec<u8>) -> ApduCommand {
        ApduCommand::new(0x80, 0xA8, 0x00, 0x00)
            .data(pdol_data)
            .le(0x00)
    }

    /// READ RECORD command
    pub fn read_record(record_number: u8, sfi: u8) -> ApduCommand {
        ApduCommand::new(0x00, 0xB2, record_number, read_record_p2(sfi)).le(0x00)
    }

    /// GET DATA command - request specific data object from card
    ///
    /// The tag goes in P1/P2; single-byte tags use P1 = 00.
    pub fn get_data(tag: &[u8]) -> ApduCommand {
        let (p1, p2) = match tag {
            [t] => (0x00, *t),
            [t1, t2, ..] => (*t1, *t2),
            [] => (0x00, 0x00),
        };
        ApduCommand::new(0x80, 0xCA, p1, p2).le(0x00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_bytes() {
        let apdu = commands::select(b"1PAY.SYS.DDF01").build().unwrap();
        assert_eq!(
            hex::encode_upper(apdu),
            "00A404000E315041592E5359532E444446303100"
        );
    }

    #[test]
    fn test_read_record_bytes() {
        assert_eq!(commands::read_record(1, 1).build().unwrap(), vec![0x00, 0xB2, 0x01, 0x0C, 0x00]);
        assert_eq!(
            commands::read_record(3, 2).le(0x1A).build().unwrap(),
            vec![0x00, 0xB2, 0x03, 0x14, 0x1A]
        );
    }

    #[test]
    fn test_gpo_and_get_data_bytes() {
        assert_eq!(
            commands::get_processing_options(vec![0x83, 0x00]).build().unwrap(),
            vec![0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]
        );
        assert_eq!(commands::get_data(&[0x9F, 0x36]).build().unwrap(), vec![0x80, 0xCA, 0x9F, 0x36, 0x00]);
        assert_eq!(commands::get_response(0x1C).build().unwrap(), vec![0x00, 0xC0, 0x00, 0x00, 0x1C]);
    }

    #[test]
    fn test_data_must_fit_lc() {
        let apdu = commands::get_processing_options(vec![0xAB; 255]).build().unwrap();
        assert_eq!(apdu[4], 0xFF);
        assert_eq!(apdu.len(), 4 + 1 + 255 + 1);

        assert_eq!(
            commands::get_processing_options(vec![0xAB; 304]).build(),
            Err(TransportError::CommandTooLong(304))
        );
    }

    #[test]
    fn test_response_from_raw() {
        let response = ApduResponse::from_raw(&[0x6F, 0x00, 0x90, 0x00]).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data, vec![0x6F, 0x00]);
        assert_eq!(response.status_string(), "9000");

        assert!(matches!(
            ApduResponse::from_raw(&[0x90]),
            Err(TransportError::ShortResponse(1))
        ));
    }

    #[test]
    fn test_command_names() {
        assert_eq!(commands::select(&[0xA0]).name(), "SELECT");
        assert_eq!(commands::get_processing_options(vec![]).name(), "GET PROCESSING OPTIONS");
        assert_eq!(ApduCommand::new(0x00, 0x88, 0, 0).name(), "APDU");
    }
}
