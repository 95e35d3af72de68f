pub mod card_type;
pub mod dump;
pub mod dump_all_tags;
pub mod info;
pub mod info_formatter;
pub mod readers;

use emv_card::{CardReader, PcscTransport};
use emv_common::{find_tag, get_tag_name};
use tracing::{info, warn};

use crate::formatters::{self, FormatMode};

/// Connect to the named reader, or the first one; errors are reported here
pub(crate) fn connect(reader_name: Option<&str>) -> Option<(PcscTransport, String)> {
    let reader = match CardReader::new() {
        Ok(r) => r,
        Err(err) => {
            warn!(error = %err, "PC/SC context unavailable");
            eprintln!("Failed to establish PC/SC context: {}", err);
            return None;
        }
    };

    let connected = match reader_name {
        Some(name) => reader.connect_named(name).map(|t| (t, name.to_string())),
        None => reader.connect_first(),
    };

    match connected {
        Ok(connected) => {
            info!(reader = %connected.1, "Card connected");
            Some(connected)
        }
        Err(err) => {
            warn!(error = %err, "Failed to connect to card");
            eprintln!("Failed to connect to card: {}", err);
            eprintln!("Please ensure a card is present on the reader");
            None
        }
    }
}

/// Display EMV tags from TLV data
pub(crate) fn display_tags(data: &[u8], mode: &FormatMode) {
    let tags: Vec<&[u8]> = vec![
        &[0x84],       // DF Name
        &[0x50],       // Application Label
        &[0x9F, 0x12], // Application Preferred Name
        &[0x87],       // Application Priority Indicator
        &[0x88],       // Short File Identifier
        &[0x5F, 0x2D], // Language Preference
        &[0x9F, 0x38], // PDOL
        &[0x5A],       // Application PAN
        &[0x5F, 0x20], // Cardholder Name
        &[0x5F, 0x24], // Application Expiration Date
        &[0x5F, 0x25], // Application Effective Date
        &[0x5F, 0x28], // Issuer Country Code
        &[0x5F, 0x34], // Application PAN Sequence Number
        &[0x57],       // Track 2 Equivalent Data
        &[0x82],       // Application Interchange Profile
        &[0x94],       // Application File Locator
        &[0x8C],       // CDOL1
        &[0x8D],       // CDOL2
        &[0x9F, 0x07], // Application Usage Control
        &[0x9F, 0x08], // Application Version Number
        &[0x9F, 0x42], // Application Currency Code
        &[0x9F, 0x6B], // Track 2 Data
    ];

    for tag in &tags {
        if let Some(value) = find_tag(data, tag) {
            let tag_name = get_tag_name(tag);
            let formatted_value = formatters::format_value(tag, value, mode);

            println!(
                "  [{}] {}: {}",
                hex::encode_upper(tag),
                tag_name,
                formatted_value
            );
        }
    }
}
