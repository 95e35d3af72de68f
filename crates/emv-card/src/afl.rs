//! Application File Locator (AFL) extraction and splitting

use std::ops::RangeInclusive;

use emv_common::convert::sfi_from_afl_byte;
use emv_common::{find_first, parse_tlv, read_length, tags};
use tracing::warn;

use crate::error::Error;

/// One 4-byte AFL group: a record range in one short file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AflEntry {
    pub sfi: u8,
    pub first_record: u8,
    pub last_record: u8,
    /// Records in the range that take part in offline data authentication
    pub offline_auth_records: u8,
}

impl AflEntry {
    pub fn from_bytes(group: [u8; 4]) -> Self {
        Self {
            sfi: sfi_from_afl_byte(group[0]),
            first_record: group[1],
            last_record: group[2],
            offline_auth_records: group[3],
        }
    }

    pub fn records(&self) -> RangeInclusive<u8> {
        self.first_record..=self.last_record
    }

    fn is_usable(&self) -> bool {
        self.sfi != 0 && self.last_record >= self.first_record
    }
}

/// Split an AFL into entries.
///
/// A trailing partial group is dropped, as are groups naming SFI 0 or an
/// empty record range.
pub fn split_afl(afl: &[u8]) -> Vec<AflEntry> {
    let groups = afl.chunks_exact(4);
    if !groups.remainder().is_empty() {
        warn!(
            length = afl.len(),
            dropped = groups.remainder().len(),
            "AFL length is not a multiple of 4, dropping trailing bytes"
        );
    }

    groups
        .map(|group| AflEntry::from_bytes([group[0], group[1], group[2], group[3]]))
        .filter(|entry| {
            let usable = entry.is_usable();
            if !usable {
                warn!(?entry, "Skipping unusable AFL entry");
            }
            usable
        })
        .collect()
}

/// Pull the raw AFL bytes out of a GET PROCESSING OPTIONS response.
///
/// Format 1 (`80`): the AIP is the first two value bytes and everything
/// after it is AFL. Format 2 (`77`): the AFL is the value of tag `94`.
pub fn extract_afl(gpo: &[u8]) -> Result<Vec<u8>, Error> {
    match gpo.first() {
        Some(0x80) => {
            let (_, value_start) = read_length(gpo, 1)?;
            gpo.get(value_start + 2..)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    Error::protocol_mismatch(
                        "GET PROCESSING OPTIONS",
                        "format 1 response shorter than its AIP",
                    )
                })
        }
        Some(0x77) => {
            let nodes = parse_tlv(gpo)?;
            find_first(&nodes, tags::AFL.0)
                .map(|node| node.value.clone())
                .ok_or_else(|| {
                    Error::protocol_mismatch("GET PROCESSING OPTIONS", "format 2 response has no AFL")
                })
        }
        Some(other) => Err(Error::protocol_mismatch(
            "GET PROCESSING OPTIONS",
            format!("unknown response template {other:02X}"),
        )),
        None => Err(Error::protocol_mismatch(
            "GET PROCESSING OPTIONS",
            "empty response",
        )),
    }
}
