//! EMV protocol implementation
//!
//! [`EmvCard`] runs the full pipeline against one card: cold reset,
//! directory discovery, per-application processing and the CPLC fetch.

use emv_common::tags;
use tracing::info;

use crate::config::SessionConfig;
use crate::discovery::{discover, Discovery};
use crate::processing::{application_label, get_data, process_application};
use crate::report::CardReport;
use crate::session::CardSession;
use crate::transport::{CardTransport, TransportError};

/// EMV card interface
pub struct EmvCard<T> {
    session: CardSession<T>,
}

impl<T: CardTransport> EmvCard<T> {
    /// Create a new EMV card interface with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            session: CardSession::new(transport, config),
        }
    }

    pub fn session(&mut self) -> &mut CardSession<T> {
        &mut self.session
    }

    pub fn into_transport(self) -> T {
        self.session.into_transport()
    }

    /// Discover candidate applications without processing them
    pub fn discover(&mut self) -> Result<Discovery, TransportError> {
        discover(&mut self.session)
    }

    /// Read all card data (discovery + every application)
    ///
    /// Fails only on a transport fault; every other problem is recorded in
    /// the report next to the data that was read.
    pub fn read_card(&mut self) -> Result<CardReport, TransportError> {
        let atr = self.session.atr()?;
        let discovery = discover(&mut self.session)?;

        let mut applications = Vec::with_capacity(discovery.candidates.len());
        for candidate in &discovery.candidates {
            applications.push(process_application(&mut self.session, candidate)?);
        }

        let cplc = if self.session.config().fetch_cplc {
            get_data(&mut self.session, tags::CPLC)?
        } else {
            None
        };

        info!(
            applications = applications.len(),
            brute_forced = discovery.brute_forced,
            "Card read complete"
        );

        Ok(CardReport {
            atr,
            discovery,
            applications,
            cplc,
        })
    }

    /// Application label of the first candidate that selects and names one
    pub fn card_type(&mut self) -> Result<Option<String>, TransportError> {
        let discovery = discover(&mut self.session)?;

        for candidate in &discovery.candidates {
            self.session.reset()?;
            let response = self.session.select(&candidate.aid)?;
            if !response.is_success() {
                continue;
            }
            if let Some(label) = application_label(&response.data) {
                return Ok(Some(label));
            }
        }

        Ok(None)
    }
}
