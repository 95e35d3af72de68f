//! PC/SC card reader management

use std::ffi::{CStr, CString};

use pcsc::{Attribute, Card, Context, Disposition, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};

use crate::apdu::{ApduCommand, ApduResponse};
use crate::transport::{CardTransport, TransportError};

/// Card reader wrapper for managing PC/SC connections
pub struct CardReader {
    context: Context,
}

impl CardReader {
    /// Create a new CardReader by establishing a PC/SC context
    pub fn new() -> Result<Self, pcsc::Error> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<String>, pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let readers = self.context.list_readers(&mut readers_buf)?;

        Ok(readers
            .map(|r| r.to_string_lossy().into_owned())
            .collect())
    }

    /// Connect to the first available reader
    pub fn connect_first(&self) -> Result<(PcscTransport, String), pcsc::Error> {
        let mut readers_buf = [0; 2048];
        let mut readers = self.context.list_readers(&mut readers_buf)?;

        let reader = readers.next().ok_or(pcsc::Error::NoReadersAvailable)?;
        let reader_name = reader.to_string_lossy().into_owned();
        let transport = self.connect(reader)?;
        Ok((transport, reader_name))
    }

    /// Connect to a reader by its display name
    pub fn connect_named(&self, reader_name: &str) -> Result<PcscTransport, pcsc::Error> {
        let name = CString::new(reader_name).map_err(|_| pcsc::Error::UnknownReader)?;
        self.connect(&name)
    }

    /// Connect to a specific reader by name (CStr)
    pub fn connect(&self, reader_name: &CStr) -> Result<PcscTransport, pcsc::Error> {
        let card = self
            .context
            .connect(reader_name, ShareMode::Shared, Protocols::ANY)?;
        Ok(PcscTransport { card })
    }
}

/// [`CardTransport`] over a connected PC/SC card
pub struct PcscTransport {
    card: Card,
}

impl PcscTransport {
    pub fn card(&self) -> &Card {
        &self.card
    }
}

impl CardTransport for PcscTransport {
    fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, TransportError> {
        let apdu = command.build()?;
        let mut response_buf = [0; MAX_BUFFER_SIZE];
        let rapdu = self.card.transmit(&apdu, &mut response_buf)?;
        ApduResponse::from_raw(rapdu)
    }

    fn reset_session(&mut self) -> Result<(), TransportError> {
        self.card
            .reconnect(ShareMode::Shared, Protocols::ANY, Disposition::ResetCard)?;
        Ok(())
    }

    fn cold_reset_atr(&mut self) -> Result<Vec<u8>, TransportError> {
        self.card
            .reconnect(ShareMode::Shared, Protocols::ANY, Disposition::UnpowerCard)?;
        Ok(self.card.get_attribute_owned(Attribute::AtrString)?)
    }
}
