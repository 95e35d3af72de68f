//! Codec errors

use thiserror::Error;

use crate::tlv::Tag;

/// A buffer that is not well-formed BER-TLV (or DOL) data.
///
/// Callers treat this as "no usable data" for the buffer or branch that
/// produced it; it never aborts a card run on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlvError {
    #[error("tag truncated at offset {offset}")]
    TruncatedTag { offset: usize },

    #[error("length field truncated at offset {offset}")]
    TruncatedLength { offset: usize },

    #[error("unsupported length form 0x{byte:02X} at offset {offset}")]
    UnsupportedLength { offset: usize, byte: u8 },

    #[error("DOL entry length {length} at offset {offset} does not fit one byte")]
    DolLengthTooLarge { offset: usize, length: usize },

    #[error("DOL requests {length} data bytes, at most {max} fit one command")]
    DolDataTooLong { length: usize, max: usize },

    #[error("tag {tag} declares {length} value bytes at offset {offset}, only {available} available")]
    ValueOverrun {
        tag: Tag,
        offset: usize,
        length: usize,
        available: usize,
    },
}
