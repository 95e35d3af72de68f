//! Session configuration
//!
//! The directory-record slack, miss limit and GPO retry count are card
//! interoperability workarounds tuned against real cards, so they live here
//! rather than as constants in the engines.

use chrono::NaiveDate;

use crate::aids;

/// Source of the Unpredictable Number (9F37) supplied through the PDOL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpredictableNumber {
    /// Always send these bytes; keeps runs reproducible
    Fixed([u8; 4]),
    /// Fresh random bytes for every data block
    Random,
}

impl UnpredictableNumber {
    pub fn bytes(&self) -> [u8; 4] {
        match self {
            Self::Fixed(bytes) => *bytes,
            Self::Random => rand::random(),
        }
    }
}

/// Terminal-side values used to fill a PDOL data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalData {
    /// Terminal Transaction Qualifiers (9F66)
    pub transaction_qualifiers: [u8; 4],
    /// Terminal Country Code (9F1A)
    pub country_code: [u8; 2],
    /// Transaction Currency Code (5F2A)
    pub currency_code: [u8; 2],
    /// Terminal Type (9F35)
    pub terminal_type: u8,
    /// Unpredictable Number (9F37)
    pub unpredictable_number: UnpredictableNumber,
    /// Transaction Date (9A); today's local date when unset
    pub transaction_date: Option<NaiveDate>,
}

impl Default for TerminalData {
    fn default() -> Self {
        Self {
            transaction_qualifiers: [0x30, 0x00, 0x00, 0x00],
            country_code: [0x02, 0x50],
            currency_code: [0x09, 0x78],
            terminal_type: 0xEA,
            unpredictable_number: UnpredictableNumber::Fixed([0xDE, 0xAD, 0xBE, 0xEF]),
            transaction_date: None,
        }
    }
}

/// Knobs for one discovery/processing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory record numbers up to and including this one never count as misses
    pub directory_record_slack: u8,
    /// Consecutive failed directory reads (past the slack) that end enumeration
    pub directory_max_misses: u8,
    /// Extra GET PROCESSING OPTIONS attempts for a non-default PDOL block
    pub gpo_retries: u8,
    /// Probe the reference AID list when both directories are empty
    pub brute_force: bool,
    /// Fetch ATC, last online ATC, PIN try counter and log objects
    pub fetch_auxiliary_data: bool,
    /// Fetch Card Production Life Cycle data once at the end of the run
    pub fetch_cplc: bool,
    /// AIDs probed by the brute-force fallback, in order
    pub reference_aids: Vec<Vec<u8>>,
    pub terminal: TerminalData,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory_record_slack: 5,
            directory_max_misses: 5,
            gpo_retries: 1,
            brute_force: true,
            fetch_auxiliary_data: true,
            fetch_cplc: true,
            reference_aids: aids::reference_aids(),
            terminal: TerminalData::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_directory_record_slack(mut self, slack: u8) -> Self {
        self.directory_record_slack = slack;
        self
    }

    pub fn with_directory_max_misses(mut self, misses: u8) -> Self {
        self.directory_max_misses = misses;
        self
    }

    pub fn with_gpo_retries(mut self, retries: u8) -> Self {
        self.gpo_retries = retries;
        self
    }

    pub fn with_brute_force(mut self, enabled: bool) -> Self {
        self.brute_force = enabled;
        self
    }

    pub fn with_auxiliary_data(mut self, enabled: bool) -> Self {
        self.fetch_auxiliary_data = enabled;
        self
    }

    pub fn with_cplc(mut self, enabled: bool) -> Self {
        self.fetch_cplc = enabled;
        self
    }

    pub fn with_reference_aids(mut self, aids: Vec<Vec<u8>>) -> Self {
        self.reference_aids = aids;
        self
    }

    pub fn with_terminal(mut self, terminal: TerminalData) -> Self {
        self.terminal = terminal;
        self
    }
}
