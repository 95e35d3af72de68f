//! EMV Common - Shared data structures and utilities for EMV processing
//!
//! Pure data transformation, no I/O: the BER-TLV tree decoder, the Data
//! Object List parser, raw tag search and the static tag dictionary.

pub mod convert;
mod dictionary;
pub mod dol;
mod error;
pub mod tlv;

pub use dol::{dol_data_length, parse_dol, DolEntry};
pub use error::TlvError;
pub use dictionary::{get_tag_name, tags, EmvTag};
pub use tlv::{encode_length, find_first, parse_tlv, read_length, read_tag, Tag, TlvNode};

/// Raw tag search over an undecoded buffer.
///
/// Looks for the tag bytes anywhere in `data` (a byte-for-byte substring
/// match, so nested objects are found without decoding their parents) and
/// returns the value that follows the first occurrence whose length field
/// fits inside the buffer.
///
/// # Arguments
/// * `data` - The EMV-encoded data to search
/// * `tag` - The tag bytes to search for
///
/// # Returns
/// * `Some(&[u8])` - The value bytes if tag is found
/// * `None` - If tag is not found or no occurrence has an in-bounds value
pub fn find_tag<'a>(data: &'a [u8], tag: &[u8]) -> Option<&'a [u8]> {
    if tag.is_empty() || data.len() < tag.len() {
        return None;
    }

    let mut start = 0;
    while let Some(found) = data[start..].windows(tag.len()).position(|w| w == tag) {
        let at = start + found;

        if let Ok((length, value_start)) = tlv::read_length(data, at + tag.len()) {
            let value = value_start
                .checked_add(length)
                .and_then(|end| data.get(value_start..end));
            if value.is_some() {
                return value;
            }
        }

        start = at + 1;
        if start + tag.len() > data.len() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_simple() {
        // Simple TLV: Tag 8F, Length 1, Value 05
        let data = &[0x8F, 0x01, 0x05];
        let result = find_tag(data, &[0x8F]);
        assert_eq!(result, Some(&[0x05][..]));
    }

    #[test]
    fn test_find_tag_two_byte() {
        // Two-byte tag: 9F46, Length 2, Value ABCD
        let data = &[0x9F, 0x46, 0x02, 0xAB, 0xCD];
        let result = find_tag(data, &[0x9F, 0x46]);
        assert_eq!(result, Some(&[0xAB, 0xCD][..]));
    }

    #[test]
    fn test_find_tag_not_found() {
        let data = &[0x8F, 0x01, 0x05];
        let result = find_tag(data, &[0x90]);
        assert_eq!(result, None);
    }

    #[test]
    fn test_find_tag_nested() {
        // Tag 70 contains Tag 8F; found without unwrapping the template
        let data = &[0x70, 0x04, 0x8F, 0x01, 0x05, 0xFF];
        assert_eq!(find_tag(data, &[0x8F]), Some(&[0x05][..]));

        let template = find_tag(data, &[0x70]).unwrap();
        assert_eq!(template, &[0x8F, 0x01, 0x05, 0xFF]);
    }

    #[test]
    fn test_find_tag_directory_record() {
        // 70 { 61 { 4F A0000000031010, 50 "VISA" } }
        let record = hex::decode("701461124F07A0000000031010500456495341870101").unwrap();
        let aid = find_tag(&record, tags::APPLICATION_IDENTIFIER.0).unwrap();
        assert_eq!(aid, hex::decode("A0000000031010").unwrap());
    }

    #[test]
    fn test_find_tag_skips_out_of_bounds_occurrence() {
        // First 0x5A claims 0x20 bytes; the later one is well-formed
        let data = &[0x5A, 0x20, 0x01, 0x5A, 0x01, 0x07];
        assert_eq!(find_tag(data, &[0x5A]), Some(&[0x07][..]));
        assert_eq!(find_tag(&[0x9F], &[0x9F, 0x38]), None);
    }
}
