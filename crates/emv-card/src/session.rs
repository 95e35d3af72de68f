//! Card session: the one value both engines thread through a run
//!
//! Owns the transport and the run configuration. All command/response
//! traffic goes through [`CardSession::exchange`], which resolves the two
//! length-retry outcomes before a caller sees the response.

use tracing::{debug, trace};

use crate::apdu::{commands, ApduCommand, ApduResponse};
use crate::config::SessionConfig;
use crate::status::StatusOutcome;
use crate::transport::{CardTransport, TransportError};

pub struct CardSession<T> {
    transport: T,
    config: SessionConfig,
}

impl<T: CardTransport> CardSession<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Warm reset; the card forgets the selected application
    pub fn reset(&mut self) -> Result<(), TransportError> {
        debug!("Resetting card session");
        self.transport.reset_session()
    }

    /// Cold reset and read the answer-to-reset
    pub fn atr(&mut self) -> Result<Vec<u8>, TransportError> {
        let atr = self.transport.cold_reset_atr()?;
        debug!(atr = %hex::encode_upper(&atr), "Cold reset");
        Ok(atr)
    }

    /// Send a single command with no retry handling
    pub fn transmit(&mut self, command: &ApduCommand) -> Result<ApduResponse, TransportError> {
        let apdu = command.build()?;
        debug!(
            command = command.name(),
            apdu = %hex::encode_upper(apdu),
            "Sending APDU"
        );
        let response = self.transport.transmit(command)?;
        trace!(
            status = %response.status(),
            data = %hex::encode_upper(&response.data),
            "Received response"
        );
        Ok(response)
    }

    /// Send a command and resolve length retries.
    ///
    /// `6Cxx` reissues the identical command once with Le = xx. `61xx`
    /// fetches the pending bytes with one GET RESPONSE. The response of the
    /// follow-up command is returned as is.
    pub fn exchange(&mut self, command: ApduCommand) -> Result<ApduResponse, TransportError> {
        let response = self.transmit(&command)?;

        match response.outcome() {
            StatusOutcome::WrongLength(le) => {
                debug!(command = command.name(), le, "Reissuing with corrected Le");
                self.transmit(&command.le(le))
            }
            StatusOutcome::MoreData(le) => {
                debug!(command = command.name(), le, "Fetching remaining data");
                self.transmit(&commands::get_response(le))
            }
            _ => Ok(response),
        }
    }

    /// SELECT by name or AID
    pub fn select(&mut self, name: &[u8]) -> Result<ApduResponse, TransportError> {
        self.exchange(commands::select(name))
    }

    pub fn read_record(&mut self, sfi: u8, record: u8) -> Result<ApduResponse, TransportError> {
        self.exchange(commands::read_record(record, sfi))
    }

    /// GET PROCESSING OPTIONS with an already wrapped `83` data block
    pub fn get_processing_options(&mut self, block: &[u8]) -> Result<ApduResponse, TransportError> {
        self.exchange(commands::get_processing_options(block.to_vec()))
    }

    pub fn get_data(&mut self, tag: &[u8]) -> Result<ApduResponse, TransportError> {
        self.exchange(commands::get_data(tag))
    }
}
