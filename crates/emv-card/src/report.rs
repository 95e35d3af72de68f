//! Aggregate result of one card run

use emv_common::{parse_tlv, TlvError, TlvNode};

use crate::discovery::Discovery;
use crate::processing::ApplicationRecord;

/// Everything a run collected, successful or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReport {
    /// Answer-to-reset from the cold reset at the start of the run
    pub atr: Vec<u8>,
    pub discovery: Discovery,
    pub applications: Vec<ApplicationRecord>,
    /// Card Production Life Cycle data (9F7F)
    pub cplc: Option<Vec<u8>>,
}

/// One raw buffer from the run with its decoded tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBuffer<'a> {
    pub label: String,
    pub raw: &'a [u8],
    pub nodes: Result<Vec<TlvNode>, TlvError>,
}

impl<'a> DecodedBuffer<'a> {
    fn new(label: impl Into<String>, raw: &'a [u8]) -> Self {
        Self {
            label: label.into(),
            raw,
            nodes: parse_tlv(raw),
        }
    }
}

impl CardReport {
    /// Label of the first application whose FCI carries one
    pub fn card_type(&self) -> Option<String> {
        self.applications.iter().find_map(ApplicationRecord::label)
    }

    /// Every collected buffer, in run order, decoded as TLV
    pub fn decoded(&self) -> Vec<DecodedBuffer<'_>> {
        let mut out = Vec::new();

        for directory in self.discovery.directories() {
            let name = directory.directory.label();
            if let Some(fci) = &directory.directory_fci {
                out.push(DecodedBuffer::new(format!("{name} FCI"), fci));
            }
            for (index, record) in directory.records.iter().enumerate() {
                out.push(DecodedBuffer::new(format!("{name} record {}", index + 1), record));
            }
        }

        for app in &self.applications {
            let aid = hex::encode_upper(&app.aid);
            if let Some(fci) = &app.select_response {
                out.push(DecodedBuffer::new(format!("{aid} FCI"), fci));
            }
            if let Some(gpo) = &app.gpo_response {
                out.push(DecodedBuffer::new(format!("{aid} GPO"), gpo));
            }
            for aef in &app.aef {
                out.push(DecodedBuffer::new(
                    format!("{aid} SFI {} record {}", aef.afl.sfi, aef.record),
                    &aef.data,
                ));
            }

            let auxiliary = [
                ("ATC", &app.atc),
                ("last online ATC", &app.last_online_atc),
                ("PIN try counter", &app.pin_try_counter),
                ("log entry", &app.log_entry),
                ("log format", &app.log_format),
            ];
            for (name, value) in auxiliary {
                if let Some(value) = value {
                    out.push(DecodedBuffer::new(format!("{aid} {name}"), value));
                }
            }
        }

        if let Some(cplc) = &self.cplc {
            out.push(DecodedBuffer::new("CPLC", cplc));
        }

        out
    }
}
