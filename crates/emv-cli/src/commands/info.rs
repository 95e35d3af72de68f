use emv_card::{EmvCard, SessionConfig};
use tracing::{info, warn};

use crate::formatters::FormatMode;

use super::connect;
use super::info_formatter::format_card_info;

pub fn cmd_info(reader_name: Option<&str>, config: SessionConfig, format_mode: FormatMode) {
    // Step 1: Connect to card reader
    let Some((transport, reader_name)) = connect(reader_name) else {
        return;
    };

    // Step 2: Discover and process every application
    let report = match EmvCard::with_config(transport, config).read_card() {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "Failed to read card data");
            eprintln!("Failed to read card data: {}", err);
            return;
        }
    };

    // Format and output
    format_card_info(&reader_name, &report, format_mode);
    info!(applications = report.applications.len(), "Report printed");
}
