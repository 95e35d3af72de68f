//! Status word classification
//!
//! Every branch in discovery and processing is driven by the outcome
//! returned here; nothing else interprets SW1/SW2 directly.

use std::fmt;

/// Status Word (SW1-SW2) from an APDU response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

impl StatusWord {
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    pub const fn to_u16(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    pub const fn outcome(&self) -> StatusOutcome {
        StatusOutcome::classify(self.sw1, self.sw2)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}

/// Semantic outcome of a command/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusOutcome {
    /// 90 00
    Success,
    /// 61 xx: issue GET RESPONSE with Le = xx
    MoreData(u8),
    /// 6C xx: reissue the same command with Le = xx
    WrongLength(u8),
    /// 6A 81: function not supported (also returned by blocked applications)
    NotSupported,
    /// 6A 82: file or application not found
    NotFound,
    /// 6A 83: record not found
    RecordNotFound,
    /// 62 83: selected file invalidated
    Invalidated,
    /// 6E 00: class not supported, answered by some regional cards to the first SELECT
    ClassNotSupported,
    /// Anything else; terminal for the current branch
    Unexpected(StatusWord),
}

impl StatusOutcome {
    /// Total mapping from (SW1, SW2) to an outcome
    pub const fn classify(sw1: u8, sw2: u8) -> Self {
        match (sw1, sw2) {
            (0x90, 0x00) => Self::Success,
            (0x61, len) => Self::MoreData(len),
            (0x6C, len) => Self::WrongLength(len),
            (0x6A, 0x81) => Self::NotSupported,
            (0x6A, 0x82) => Self::NotFound,
            (0x6A, 0x83) => Self::RecordNotFound,
            (0x62, 0x83) => Self::Invalidated,
            (0x6E, 0x00) => Self::ClassNotSupported,
            _ => Self::Unexpected(StatusWord::new(sw1, sw2)),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::MoreData(len) => write!(f, "{len} more bytes available"),
            Self::WrongLength(len) => write!(f, "wrong length, expected {len}"),
            Self::NotSupported => f.write_str("function not supported"),
            Self::NotFound => f.write_str("not found"),
            Self::RecordNotFound => f.write_str("record not found"),
            Self::Invalidated => f.write_str("selected file invalidated"),
            Self::ClassNotSupported => f.write_str("class not supported"),
            Self::Unexpected(sw) => write!(f, "unexpected status {sw}"),
        }
    }
}
