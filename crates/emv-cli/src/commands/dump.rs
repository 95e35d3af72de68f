use emv_card::{EmvCard, SessionConfig};
use tracing::{info, warn};

use super::connect;
use super::dump_all_tags::dump_buffer;

pub fn cmd_dump(reader_name: Option<&str>, config: SessionConfig) {
    println!("EMV Tag Dump - All TLV Tags\n");

    let Some((transport, reader_name)) = connect(reader_name) else {
        return;
    };

    println!("Reader: {}", reader_name);
    println!("Card connected successfully\n");

    let report = match EmvCard::with_config(transport, config).read_card() {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "Failed to read card data");
            eprintln!("Failed to read card data: {}", err);
            return;
        }
    };

    println!("ATR: {}\n", hex::encode_upper(&report.atr));

    let buffers = report.decoded();
    println!("=== DUMPING ALL TLV TAGS FROM ALL BUFFERS ===\n");
    println!("Total buffers: {}\n", buffers.len());

    for buffer in &buffers {
        dump_buffer(buffer);
        println!();
    }

    println!("=== Dump Complete ===");
    info!(buffers = buffers.len(), "Dump printed");
}
