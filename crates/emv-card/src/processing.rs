//! Per-application processing
//!
//! SELECT, PDOL data block, GET PROCESSING OPTIONS, AFL traversal and the
//! auxiliary GET DATA objects for one candidate AID. Whatever was read
//! before a local failure stays on the [`ApplicationRecord`].

use emv_common::convert::{ascii, be_uint};
use emv_common::{find_first, find_tag, parse_tlv, tags, EmvTag};
use tracing::{debug, info, warn};

use crate::afl::{extract_afl, split_afl, AflEntry};
use crate::discovery::{Candidate, CandidateSource};
use crate::error::Error;
use crate::pdol::{DolBuilder, DEFAULT_PDOL_BLOCK};
use crate::session::CardSession;
use crate::transport::{CardTransport, TransportError};

/// One record read through the AFL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AefRecord {
    /// AFL entry that named the record
    pub afl: AflEntry,
    pub record: u8,
    pub data: Vec<u8>,
}

/// Everything read for one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub aid: Vec<u8>,
    pub source: CandidateSource,
    /// FCI returned by SELECT
    pub select_response: Option<Vec<u8>>,
    /// Raw PDOL value (9F38) from the FCI
    pub pdol: Option<Vec<u8>>,
    /// `83` block sent with GET PROCESSING OPTIONS
    pub pdol_data_block: Option<Vec<u8>>,
    pub gpo_response: Option<Vec<u8>>,
    pub afl: Vec<AflEntry>,
    pub aef: Vec<AefRecord>,
    pub atc: Option<Vec<u8>>,
    pub last_online_atc: Option<Vec<u8>>,
    pub pin_try_counter: Option<Vec<u8>>,
    pub log_entry: Option<Vec<u8>>,
    pub log_format: Option<Vec<u8>>,
    /// Local failure that ended processing early
    pub failure: Option<Error>,
    /// Non-fatal problems worked around along the way
    pub anomalies: Vec<Error>,
}

impl ApplicationRecord {
    pub fn new(candidate: &Candidate) -> Self {
        Self {
            aid: candidate.aid.clone(),
            source: candidate.source,
            select_response: None,
            pdol: None,
            pdol_data_block: None,
            gpo_response: None,
            afl: Vec::new(),
            aef: Vec::new(),
            atc: None,
            last_online_atc: None,
            pin_try_counter: None,
            log_entry: None,
            log_format: None,
            failure: None,
            anomalies: Vec::new(),
        }
    }

    /// Application Label (50) from the FCI
    pub fn label(&self) -> Option<String> {
        let fci = self.select_response.as_deref()?;
        application_label(fci)
    }

    /// Application Transaction Counter as a number
    pub fn atc_value(&self) -> Option<u64> {
        data_object_value(self.atc.as_deref()?, tags::APPLICATION_TRANSACTION_COUNTER)
    }

    pub fn last_online_atc_value(&self) -> Option<u64> {
        data_object_value(self.last_online_atc.as_deref()?, tags::LAST_ONLINE_ATC_REGISTER)
    }

    pub fn pin_tries_remaining(&self) -> Option<u64> {
        data_object_value(self.pin_try_counter.as_deref()?, tags::PIN_TRY_COUNTER)
    }

    /// Whether processing ran to the end of the AFL without a local failure
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Application Label (50) from a raw FCI
pub fn application_label(fci: &[u8]) -> Option<String> {
    let value = match parse_tlv(fci) {
        Ok(nodes) => find_first(&nodes, tags::APPLICATION_LABEL.0).map(|node| node.value.clone()),
        Err(_) => find_tag(fci, tags::APPLICATION_LABEL.0).map(<[u8]>::to_vec),
    }?;
    Some(ascii(&value))
}

/// GET DATA answers either with the full TLV object or with the bare value
fn data_object_value(raw: &[u8], tag: EmvTag) -> Option<u64> {
    match raw.strip_prefix(tag.0) {
        Some(_) => find_tag(raw, tag.0).and_then(be_uint),
        None => be_uint(raw),
    }
}

/// Process one candidate from a fresh session.
///
/// Only a transport fault is returned as an error.
pub fn process_application<T: CardTransport>(
    session: &mut CardSession<T>,
    candidate: &Candidate,
) -> Result<ApplicationRecord, TransportError> {
    session.reset()?;

    let mut record = ApplicationRecord::new(candidate);
    let aid = hex::encode_upper(&record.aid);
    info!(aid = %aid, "Processing application");

    if let Err(err) = run(session, &mut record) {
        let err = err.into_local()?;
        warn!(aid = %aid, error = %err, "Application processing stopped");
        record.failure = Some(err);
    }

    if session.config().fetch_auxiliary_data {
        fetch_auxiliary_data(session, &mut record)?;
    }

    info!(aid = %aid, records = record.aef.len(), "Application processed");
    Ok(record)
}

fn run<T: CardTransport>(
    session: &mut CardSession<T>,
    record: &mut ApplicationRecord,
) -> Result<(), Error> {
    let response = session.select(&record.aid)?;
    if !response.is_success() {
        return Err(Error::card_status("SELECT", response.status()));
    }
    let fci = response.data;

    record.pdol = find_tag(&fci, tags::PDOL.0).map(<[u8]>::to_vec);
    record.select_response = Some(fci);

    let builder = DolBuilder::new(session.config().terminal.clone());
    let block = match builder.build_from_raw(record.pdol.as_deref()) {
        Ok(block) => block,
        Err(err) => {
            warn!(error = %err, "PDOL does not parse, sending empty data block");
            record.anomalies.push(err.into());
            DEFAULT_PDOL_BLOCK.to_vec()
        }
    };
    record.pdol_data_block = Some(block.clone());

    let gpo = negotiate_options(session, &block)?;
    record.gpo_response = Some(gpo.clone());

    let afl = extract_afl(&gpo)?;
    if afl.len() % 4 != 0 {
        record.anomalies.push(Error::MalformedAfl { length: afl.len() });
    }
    record.afl = split_afl(&afl);
    info!(entries = record.afl.len(), "AFL parsed");

    read_aef_records(session, record)?;
    Ok(())
}

/// GET PROCESSING OPTIONS; a non-default block gets the configured retries
fn negotiate_options<T: CardTransport>(
    session: &mut CardSession<T>,
    block: &[u8],
) -> Result<Vec<u8>, Error> {
    let attempts = if block == DEFAULT_PDOL_BLOCK {
        1
    } else {
        1 + u32::from(session.config().gpo_retries)
    };

    let mut attempt = 1;
    loop {
        let response = session.get_processing_options(block)?;
        if response.is_success() {
            return Ok(response.data);
        }

        if attempt >= attempts {
            return Err(Error::card_status("GET PROCESSING OPTIONS", response.status()));
        }
        debug!(attempt, status = %response.status(), "GET PROCESSING OPTIONS failed, retrying");
        attempt += 1;
    }
}

/// Read every record the AFL names; failed reads are skipped
fn read_aef_records<T: CardTransport>(
    session: &mut CardSession<T>,
    record: &mut ApplicationRecord,
) -> Result<(), TransportError> {
    for entry in record.afl.clone() {
        for number in entry.records() {
            let response = session.read_record(entry.sfi, number)?;
            if response.is_success() {
                record.aef.push(AefRecord {
                    afl: entry,
                    record: number,
                    data: response.data,
                });
            } else {
                debug!(
                    sfi = entry.sfi,
                    record = number,
                    status = %response.status(),
                    "Skipping unreadable record"
                );
            }
        }
    }
    Ok(())
}

fn fetch_auxiliary_data<T: CardTransport>(
    session: &mut CardSession<T>,
    record: &mut ApplicationRecord,
) -> Result<(), TransportError> {
    record.atc = get_data(session, tags::APPLICATION_TRANSACTION_COUNTER)?;
    record.last_online_atc = get_data(session, tags::LAST_ONLINE_ATC_REGISTER)?;
    record.pin_try_counter = get_data(session, tags::PIN_TRY_COUNTER)?;
    record.log_entry = get_data(session, tags::LOG_ENTRY)?;
    record.log_format = get_data(session, tags::LOG_FORMAT)?;
    Ok(())
}

/// Best-effort GET DATA: anything but success with data is absence
pub(crate) fn get_data<T: CardTransport>(
    session: &mut CardSession<T>,
    tag: EmvTag,
) -> Result<Option<Vec<u8>>, TransportError> {
    let response = session.get_data(tag.0)?;
    if response.is_success() && !response.data.is_empty() {
        Ok(Some(response.data))
    } else {
        debug!(tag = %hex::encode_upper(tag.0), status = %response.status(), "GET DATA unavailable");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_label() {
        let fci = hex::decode("6F1B8407A0000000031010A510500B56495341204352454449548701 01".replace(' ', ""))
            .unwrap();
        assert_eq!(application_label(&fci).as_deref(), Some("VISA CREDIT"));
        assert_eq!(application_label(&[0x6F, 0x00]), None);
    }

    #[test]
    fn test_data_object_value() {
        assert_eq!(
            data_object_value(&[0x9F, 0x36, 0x02, 0x00, 0x2A], tags::APPLICATION_TRANSACTION_COUNTER),
            Some(42)
        );
        assert_eq!(data_object_value(&[0x03], tags::PIN_TRY_COUNTER), Some(3));
    }

    #[test]
    fn test_record_accessors() {
        let candidate = Candidate {
            aid: vec![0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10],
            source: CandidateSource::ReferenceList,
        };
        let mut record = ApplicationRecord::new(&candidate);
        assert!(record.label().is_none());
        assert!(record.is_complete());

        record.pin_try_counter = Some(vec![0x9F, 0x17, 0x01, 0x03]);
        assert_eq!(record.pin_tries_remaining(), Some(3));
        assert_eq!(record.atc_value(), None);
    }
}
