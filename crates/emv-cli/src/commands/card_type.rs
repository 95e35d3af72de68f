use emv_card::{EmvCard, SessionConfig};
use tracing::debug;

use super::connect;

pub fn cmd_type(reader_name: Option<&str>, config: SessionConfig) {
    let Some((transport, _reader_name)) = connect(reader_name) else {
        return;
    };

    match EmvCard::with_config(transport, config).card_type() {
        Ok(Some(label)) => println!("{}", label),
        Ok(None) => {
            debug!("No application answered with a label");
            println!("Unknown card type")
        }
        Err(err) => eprintln!("Failed to read card: {}", err),
    }
}
