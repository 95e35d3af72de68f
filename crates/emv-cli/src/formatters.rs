//! Field formatters for human-readable output

use clap::ValueEnum;
use emv_card::afl::split_afl;
use emv_common::convert::{ascii, be_uint};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatMode {
    /// Raw hex output
    Raw,
    /// Human-readable formatted output
    Human,
}

impl FormatMode {
    pub fn description(&self) -> &'static str {
        match self {
            FormatMode::Raw => "Raw",
            FormatMode::Human => "Human-Readable",
        }
    }
}

/// Format a field value based on its tag type
pub fn format_value(tag: &[u8], value: &[u8], mode: &FormatMode) -> String {
    if *mode == FormatMode::Raw {
        return hex::encode_upper(value);
    }

    match tag {
        // Text fields
        [0x50] | [0x9F, 0x12] | [0x5F, 0x2D] => ascii(value),

        // Cardholder Name
        [0x5F, 0x20] => ascii(value).trim().to_string(),

        // DF Name: directory names are ASCII, AIDs are not
        [0x84] => {
            if value.iter().all(|b| b.is_ascii_graphic()) {
                ascii(value)
            } else {
                hex::encode_upper(value)
            }
        }

        // Application Expiration Date (YYMMDD)
        [0x5F, 0x24] if value.len() == 3 => {
            format!("20{:02X}/{:02X} (Year/Month)", value[0], value[1])
        }

        // Application Effective Date / Transaction Date (YYMMDD)
        [0x5F, 0x25] | [0x9A] if value.len() == 3 => format!(
            "20{:02X}/{:02X}/{:02X} (YY/MM/DD)",
            value[0], value[1], value[2]
        ),

        // Country Codes (ISO 3166-1 numeric, BCD)
        [0x5F, 0x28] | [0x9F, 0x1A] => match bcd_number(value) {
            Some(code) => match get_country_name(code) {
                Some(country) => format!("{} ({})", code, country),
                None => format!("{}", code),
            },
            None => hex::encode_upper(value),
        },

        // Currency Codes (ISO 4217 numeric, BCD)
        [0x5F, 0x2A] | [0x9F, 0x42] => match bcd_number(value) {
            Some(code) => match get_currency_name(code) {
                Some(currency) => currency.to_string(),
                None => format!("Currency Code {}", code),
            },
            None => hex::encode_upper(value),
        },

        // Single-byte counters
        [0x5F, 0x34] | [0x9F, 0x17] if value.len() == 1 => format!("{}", value[0]),

        // Application Priority Indicator
        [0x87] if value.len() == 1 => {
            format!("{} (lower = higher priority)", value[0] & 0x0F)
        }

        // Short File Identifier
        [0x88] if value.len() == 1 => format!("{}", value[0]),

        // Transaction counters
        [0x9F, 0x36] | [0x9F, 0x13] => match be_uint(value) {
            Some(count) => format!("{}", count),
            None => hex::encode_upper(value),
        },

        // Application Interchange Profile
        [0x82] if value.len() == 2 => format_aip(value),

        // Application File Locator
        [0x94] => split_afl(value)
            .iter()
            .map(|entry| {
                format!(
                    "SFI {} records {}-{} ({} for ODA)",
                    entry.sfi, entry.first_record, entry.last_record, entry.offline_auth_records
                )
            })
            .collect::<Vec<_>>()
            .join(", "),

        // Track 2 Data
        [0x57] | [0x9F, 0x6B] => {
            let hex_str = hex::encode_upper(value);
            hex_str.replace('D', " | ")
        }

        // Large binary fields
        _ if value.len() > 32 => format!(
            "{} ... ({} bytes total)",
            hex::encode_upper(&value[..32]),
            value.len()
        ),

        // Default: hex for everything else
        _ => hex::encode_upper(value),
    }
}

/// Decimal value of packed BCD digits
fn bcd_number(value: &[u8]) -> Option<u16> {
    hex::encode(value).parse().ok()
}

fn format_aip(value: &[u8]) -> String {
    const FLAGS: [(u8, &str); 6] = [
        (0x40, "SDA"),
        (0x20, "DDA"),
        (0x10, "cardholder verification"),
        (0x08, "terminal risk management"),
        (0x04, "issuer authentication"),
        (0x01, "CDA"),
    ];

    let supported: Vec<&str> = FLAGS
        .iter()
        .filter(|(bit, _)| value[0] & bit != 0)
        .map(|(_, name)| *name)
        .collect();

    if supported.is_empty() {
        hex::encode_upper(value)
    } else {
        format!("{} ({})", hex::encode_upper(value), supported.join(", "))
    }
}

/// ISO 3166-1 numeric country codes (subset)
fn get_country_name(code: u16) -> Option<&'static str> {
    match code {
        40 => Some("Austria"),
        56 => Some("Belgium"),
        124 => Some("Canada"),
        156 => Some("China"),
        250 => Some("France"),
        276 => Some("Germany"),
        380 => Some("Italy"),
        392 => Some("Japan"),
        528 => Some("Netherlands"),
        724 => Some("Spain"),
        756 => Some("Switzerland"),
        826 => Some("United Kingdom"),
        840 => Some("United States"),
        _ => None,
    }
}

/// ISO 4217 numeric currency codes (subset)
fn get_currency_name(code: u16) -> Option<&'static str> {
    match code {
        124 => Some("CAD (Canadian Dollar)"),
        156 => Some("CNY (Chinese Yuan)"),
        392 => Some("JPY (Japanese Yen)"),
        756 => Some("CHF (Swiss Franc)"),
        826 => Some("GBP (Pound Sterling)"),
        840 => Some("USD (US Dollar)"),
        978 => Some("EUR (Euro)"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_mode_is_hex() {
        assert_eq!(format_value(&[0x50], b"VISA", &FormatMode::Raw), "56495341");
    }

    #[test]
    fn test_bcd_codes() {
        assert_eq!(format_value(&[0x5F, 0x2A], &[0x09, 0x78], &FormatMode::Human), "EUR (Euro)");
        assert_eq!(
            format_value(&[0x9F, 0x1A], &[0x02, 0x50], &FormatMode::Human),
            "250 (France)"
        );
    }

    #[test]
    fn test_afl_and_aip() {
        assert_eq!(
            format_value(&[0x94], &[0x08, 0x01, 0x03, 0x00], &FormatMode::Human),
            "SFI 1 records 1-3 (0 for ODA)"
        );
        assert_eq!(
            format_value(&[0x82], &[0x19, 0x80], &FormatMode::Human),
            "1980 (cardholder verification, terminal risk management, CDA)"
        );
    }

    #[test]
    fn test_text_and_counters() {
        assert_eq!(format_value(&[0x50], b"MASTERCARD", &FormatMode::Human), "MASTERCARD");
        assert_eq!(format_value(&[0x9F, 0x36], &[0x00, 0x2A], &FormatMode::Human), "42");
        assert_eq!(format_value(&[0x84], b"2PAY.SYS.DDF01", &FormatMode::Human), "2PAY.SYS.DDF01");
    }
}
