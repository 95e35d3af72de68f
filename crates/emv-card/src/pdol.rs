//! PDOL data block synthesis
//!
//! Fills each object the card requests with terminal data when both the tag
//! and the requested length match a known rule, zeros otherwise, and wraps
//! the result under tag `83`.

use chrono::{Datelike, Local, NaiveDate};
use emv_common::convert::bcd;
use emv_common::{dol_data_length, encode_length, parse_dol, tags, DolEntry, TlvError};

use crate::config::TerminalData;

/// Block sent when the card supplies no PDOL
pub const DEFAULT_PDOL_BLOCK: [u8; 2] = [0x83, 0x00];

/// Most PDOL data one GET PROCESSING OPTIONS carries: a 255-byte Lc less
/// the `83 81 xx` header
pub const MAX_PDOL_DATA: usize = 252;

pub struct DolBuilder {
    terminal: TerminalData,
    date: NaiveDate,
}

impl DolBuilder {
    pub fn new(terminal: TerminalData) -> Self {
        let date = terminal
            .transaction_date
            .unwrap_or_else(|| Local::now().date_naive());
        Self { terminal, date }
    }

    /// Override the transaction date (9A)
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Build the `83` block for a parsed DOL.
    ///
    /// A DOL asking for more than [`MAX_PDOL_DATA`] bytes is refused before
    /// anything is allocated.
    pub fn build(&self, entries: &[DolEntry]) -> Result<Vec<u8>, TlvError> {
        if entries.is_empty() {
            return Ok(DEFAULT_PDOL_BLOCK.to_vec());
        }

        let length = dol_data_length(entries);
        if length > MAX_PDOL_DATA {
            return Err(TlvError::DolDataTooLong {
                length,
                max: MAX_PDOL_DATA,
            });
        }

        let mut block = Vec::with_capacity(length + 3);
        block.push(tags::COMMAND_TEMPLATE.0[0]);
        block.extend(encode_length(length));
        for entry in entries {
            block.extend(self.value(entry));
        }
        Ok(block)
    }

    /// Parse the raw PDOL value and build its block; absent means default
    pub fn build_from_raw(&self, pdol: Option<&[u8]>) -> Result<Vec<u8>, TlvError> {
        match pdol {
            None => Ok(DEFAULT_PDOL_BLOCK.to_vec()),
            Some(raw) => parse_dol(raw).and_then(|entries| self.build(&entries)),
        }
    }

    fn value(&self, entry: &DolEntry) -> Vec<u8> {
        let t = &self.terminal;
        let value: Option<Vec<u8>> = match (entry.tag.as_bytes(), entry.expected_length) {
            ([0x9F, 0x66], 4) => Some(t.transaction_qualifiers.to_vec()),
            ([0x9F, 0x1A], 2) => Some(t.country_code.to_vec()),
            ([0x5F, 0x2A], 2) => Some(t.currency_code.to_vec()),
            ([0x9A], 3) => Some(self.transaction_date().to_vec()),
            ([0x9F, 0x35], 1) => Some(vec![t.terminal_type]),
            ([0x9F, 0x37], 4) => Some(t.unpredictable_number.bytes().to_vec()),
            _ => None,
        };

        value.unwrap_or_else(|| vec![0; entry.expected_length])
    }

    /// YYMMDD, BCD packed
    fn transaction_date(&self) -> [u8; 3] {
        [
            bcd((self.date.year().rem_euclid(100)) as u8),
            bcd(self.date.month() as u8),
            bcd(self.date.day() as u8),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnpredictableNumber;
    use emv_common::Tag;

    fn builder() -> DolBuilder {
        DolBuilder::new(TerminalData::default())
            .on_date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
    }

    #[test]
    fn test_default_block() {
        assert_eq!(builder().build(&[]).unwrap(), vec![0x83, 0x00]);
        assert_eq!(builder().build_from_raw(None).unwrap(), vec![0x83, 0x00]);
        assert_eq!(builder().build_from_raw(Some(&[])).unwrap(), vec![0x83, 0x00]);
    }

    #[test]
    fn test_known_tags() {
        let pdol = hex::decode("9F66049F02069F37045F2A029A039F1A029F3501").unwrap();
        let block = builder().build_from_raw(Some(&pdol)).unwrap();

        assert_eq!(
            hex::encode_upper(block),
            "8316\
             30000000\
             000000000000\
             DEADBEEF\
             0978\
             240307\
             0250\
             EA"
            .replace(' ', "")
        );
    }

    #[test]
    fn test_length_mismatch_zero_fills() {
        let entries = vec![
            DolEntry { tag: Tag::new([0x9F, 0x66]), expected_length: 2 },
            DolEntry { tag: Tag::new([0x9A]), expected_length: 4 },
        ];
        assert_eq!(builder().build(&entries).unwrap(), vec![0x83, 0x06, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_long_form_length() {
        let entries = vec![DolEntry { tag: Tag::new([0xDF, 0x01]), expected_length: 200 }];
        let block = builder().build(&entries).unwrap();
        assert_eq!(&block[..3], &[0x83, 0x81, 0xC8]);
        assert_eq!(block.len(), 203);
    }

    #[test]
    fn test_random_unpredictable_number_length() {
        let terminal = TerminalData {
            unpredictable_number: UnpredictableNumber::Random,
            ..TerminalData::default()
        };
        let entries = vec![DolEntry { tag: Tag::new([0x9F, 0x37]), expected_length: 4 }];
        let block = DolBuilder::new(terminal).build(&entries).unwrap();
        assert_eq!(block.len(), 6);
        assert_eq!(&block[..2], &[0x83, 0x04]);
    }

    #[test]
    fn test_malformed_pdol() {
        assert!(builder().build_from_raw(Some(&[0x9F])).is_err());
    }

    #[test]
    fn test_block_must_fit_one_command() {
        let entries = |lengths: &[usize]| -> Vec<DolEntry> {
            lengths
                .iter()
                .map(|&expected_length| DolEntry { tag: Tag::new([0xDF, 0x01]), expected_length })
                .collect()
        };

        let block = builder().build(&entries(&[200, 52])).unwrap();
        assert_eq!(&block[..3], &[0x83, 0x81, 0xFC]);
        assert_eq!(block.len(), 255);

        assert_eq!(
            builder().build(&entries(&[200, 104])),
            Err(TlvError::DolDataTooLong { length: 304, max: MAX_PDOL_DATA })
        );
        assert_eq!(
            builder().build(&entries(&[usize::MAX, 4])),
            Err(TlvError::DolDataTooLong { length: usize::MAX, max: MAX_PDOL_DATA })
        );
    }

    #[test]
    fn test_card_declared_lengths_are_bounded() {
        // DF01 asks for 300 bytes through a two-byte length
        let pdol = hex::decode("9F3704DF0182012C").unwrap();
        assert!(matches!(
            builder().build_from_raw(Some(&pdol)),
            Err(TlvError::DolLengthTooLarge { length: 300, .. })
        ));

        let pdol = hex::decode("9F378440000000").unwrap();
        assert!(builder().build_from_raw(Some(&pdol)).is_err());

        // Two one-byte lengths that overflow the block together
        let pdol = hex::decode("DF0181C8DF0268").unwrap();
        assert_eq!(
            builder().build_from_raw(Some(&pdol)),
            Err(TlvError::DolDataTooLong { length: 304, max: MAX_PDOL_DATA })
        );
    }
}
