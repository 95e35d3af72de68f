//! Hardware-dependent integration tests
//!
//! These tests require a physical EMV card in a card reader.
//! They are ignored by default and must be explicitly run with:
//!
//!     cargo test --package emv-card --test hardware_integration -- --ignored
//!
//! Or to run all tests including hardware tests:
//!
//!     cargo test --package emv-card --test hardware_integration -- --include-ignored

use emv_card::aids;
use emv_card::{CardReader, CardSession, CardTransport, EmvCard, SessionConfig};

/// Test that we can connect to a card reader
///
/// **Requires**: Card reader connected (card not required)
#[test]
#[ignore = "requires hardware: card reader"]
fn test_connect_to_reader() {
    let reader = CardReader::new().expect("Failed to establish PC/SC context");
    let readers = reader.list_readers().expect("Failed to list readers");
    assert!(!readers.is_empty(), "No card reader connected");
}

/// Test that we can detect an inserted card and read its ATR
///
/// **Requires**: Card reader with card inserted
#[test]
#[ignore = "requires hardware: card inserted in reader"]
fn test_card_present() {
    let reader = CardReader::new().expect("Failed to connect to reader");
    let (mut transport, reader_name) = reader.connect_first().expect("Failed to connect to card");

    println!("Connected to reader: {}", reader_name);
    let atr = transport.cold_reset_atr().expect("Failed to read ATR");
    println!("ATR: {}", hex::encode_upper(&atr));
    assert!(!atr.is_empty());
}

/// Test selecting a known EMV application
///
/// **Requires**: EMV card (credit/debit card) inserted
#[test]
#[ignore = "requires hardware: EMV card"]
fn test_select_emv_application() {
    let reader = CardReader::new().expect("Failed to connect to reader");
    let (transport, _reader_name) = reader.connect_first().expect("Failed to connect to card");
    let mut session = CardSession::new(transport, SessionConfig::default());

    let known_aids = [
        ("Visa", aids::VISA),
        ("Mastercard", aids::MASTERCARD),
        ("AmEx", aids::AMEX),
    ];

    let mut selected = false;
    for (name, aid) in &known_aids {
        let response = session.select(aid).expect("Transport failure");
        if response.is_success() {
            println!("Successfully selected {} ({})", name, hex::encode_upper(aid));
            selected = true;
            break;
        }
    }

    assert!(selected, "No EMV application could be selected");
}

/// Full end-to-end run: discovery, processing and CPLC
///
/// **Requires**: EMV card (credit/debit card) inserted
#[test]
#[ignore = "requires hardware: EMV card"]
fn test_full_card_read() {
    let reader = CardReader::new().expect("Failed to connect to reader");
    let (transport, _reader_name) = reader.connect_first().expect("Failed to connect to card");

    let report = EmvCard::new(transport).read_card().expect("Transport failure");

    println!("ATR: {}", hex::encode_upper(&report.atr));
    for candidate in &report.discovery.candidates {
        println!("Candidate {} ({:?})", hex::encode_upper(&candidate.aid), candidate.source);
    }
    for app in &report.applications {
        println!(
            "{}: {} AFL entries, {} records, failure: {:?}",
            hex::encode_upper(&app.aid),
            app.afl.len(),
            app.aef.len(),
            app.failure
        );
    }

    assert!(!report.applications.is_empty(), "No application found");
    assert!(
        report.applications.iter().any(|app| !app.aef.is_empty()),
        "No records could be read"
    );
}

/// Test reading the application label
///
/// **Requires**: EMV card inserted
#[test]
#[ignore = "requires hardware: EMV card"]
fn test_card_type() {
    let reader = CardReader::new().expect("Failed to connect to reader");
    let (transport, _reader_name) = reader.connect_first().expect("Failed to connect to card");

    let label = EmvCard::new(transport).card_type().expect("Transport failure");
    println!("Card type: {:?}", label);
    assert!(label.is_some());
}
