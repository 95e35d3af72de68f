//! Data Object List (PDOL/CDOL) parsing
//!
//! A DOL is a TLV stream with no value parts: each entry names a tag and
//! the number of bytes a later payload must supply for it, in order.

use crate::error::TlvError;
use crate::tlv::{read_length, read_tag, Tag};

/// One requested data object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DolEntry {
    pub tag: Tag,
    pub expected_length: usize,
}

/// Parse a DOL buffer into (tag, expected length) pairs.
///
/// DOL lengths are a single byte; a longer length field is rejected.
pub fn parse_dol(data: &[u8]) -> Result<Vec<DolEntry>, TlvError> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let (tag, after_tag) = read_tag(data, pos)?;
        let (expected_length, next) = read_length(data, after_tag)?;
        if expected_length > u8::MAX as usize {
            return Err(TlvError::DolLengthTooLarge {
                offset: after_tag,
                length: expected_length,
            });
        }
        entries.push(DolEntry {
            tag,
            expected_length,
        });
        pos = next;
    }

    Ok(entries)
}

/// Sum of the lengths a DOL asks for
pub fn dol_data_length(entries: &[DolEntry]) -> usize {
    entries
        .iter()
        .fold(0usize, |sum, e| sum.saturating_add(e.expected_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dol() {
        assert!(parse_dol(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_visa_pdol() {
        // 9F66 04, 9F02 06, 9F37 04, 5F2A 02, 9A 03
        let pdol = hex::decode("9F66049F02069F37045F2A029A03").unwrap();
        let entries = parse_dol(&pdol).unwrap();

        let tags: Vec<String> = entries.iter().map(|e| e.tag.to_hex()).collect();
        assert_eq!(tags, ["9F66", "9F02", "9F37", "5F2A", "9A"]);
        assert_eq!(entries[1].expected_length, 6);
        assert_eq!(dol_data_length(&entries), 19);
    }

    #[test]
    fn test_truncated_dol() {
        // Length byte of the second entry is missing
        let err = parse_dol(&[0x9A, 0x03, 0x9F, 0x37]).unwrap_err();
        assert_eq!(err, TlvError::TruncatedLength { offset: 4 });
    }

    #[test]
    fn test_multi_byte_length_rejected() {
        let err = parse_dol(&hex::decode("9F3704DF0182012C").unwrap()).unwrap_err();
        assert_eq!(err, TlvError::DolLengthTooLarge { offset: 5, length: 300 });

        let err = parse_dol(&hex::decode("9F378440000000").unwrap()).unwrap_err();
        assert_eq!(err, TlvError::DolLengthTooLarge { offset: 2, length: 0x4000_0000 });

        // 81 C8 still names a one-byte length
        let entries = parse_dol(&hex::decode("DF0181C8").unwrap()).unwrap();
        assert_eq!(entries[0].expected_length, 200);
    }
}
