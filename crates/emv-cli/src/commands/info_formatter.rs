//! Formatter for card information output

use emv_card::aids;
use emv_card::{ApplicationRecord, CandidateSource, CardReport, DiscoveryResult};
use emv_common::find_tag;

use crate::formatters::FormatMode;

use super::display_tags;

/// Format and output card information
pub fn format_card_info(reader_name: &str, report: &CardReport, format_mode: FormatMode) {
    println!("EMV Card Reader - {} Mode\n", format_mode.description());

    // Reader info
    println!("Reader: {}", reader_name);
    println!("ATR: {}\n", hex::encode_upper(&report.atr));

    // Directories
    println!("=== Discovering Available Applications ===\n");
    for directory in report.discovery.directories() {
        print_directory(directory, format_mode);
    }
    if report.discovery.brute_forced {
        println!("No payment directory listed an application; probed known AIDs\n");
    }

    if report.applications.is_empty() {
        println!("No applications found\n");
    } else {
        println!("Found {} application(s)\n", report.applications.len());
    }

    // Applications
    for (i, app) in report.applications.iter().enumerate() {
        print_application(i + 1, app, format_mode);
    }

    if let Some(cplc) = &report.cplc {
        println!("=== Card Production Life Cycle ===\n");
        println!("  {}\n", hex::encode_upper(cplc));
    }

    println!("=== Card Reading Complete ===");
}

fn print_directory(directory: &DiscoveryResult, format_mode: FormatMode) {
    let name = directory.directory.label();

    let Some(fci) = &directory.directory_fci else {
        match &directory.failure {
            Some(err) => println!("{}: {}\n", name, err),
            None => println!("{}: not present\n", name),
        }
        return;
    };

    println!("{}:", name);
    if format_mode == FormatMode::Raw {
        println!("  FCI: {}", hex::encode_upper(fci));
    } else {
        display_tags(fci, &format_mode);
    }

    match directory.sfi {
        Some(sfi) => println!("  Directory SFI: {} ({} records)", sfi, directory.records.len()),
        None => println!("  No directory SFI"),
    }
    for aid in &directory.candidate_aids {
        println!("  AID: {}", hex::encode_upper(aid));
    }
    if let Some(err) = &directory.failure {
        println!("  Stopped: {}", err);
    }
    println!();
}

fn print_application(index: usize, app: &ApplicationRecord, format_mode: FormatMode) {
    println!("=== Application {} ===\n", index);
    println!("AID: {}", hex::encode_upper(&app.aid));
    if let Some(label) = app.label() {
        println!("Label: {}", label);
    }
    let source = match app.source {
        CandidateSource::Directory(directory) => directory.label(),
        CandidateSource::ReferenceList => "known AID list",
    };
    println!("Found via: {}", source);
    if let Some(description) = aids::describe(&app.aid) {
        println!("Known as: {}", description);
    }

    // SELECT response
    if let Some(select_response) = &app.select_response {
        println!("\nSELECT Response ({} bytes):", select_response.len());
        print_buffer(select_response, format_mode);
    }

    if let Some(block) = &app.pdol_data_block {
        println!("\nPDOL data block: {}", hex::encode_upper(block));
    }

    // GPO response
    if let Some(gpo_data) = &app.gpo_response {
        println!("\nGET PROCESSING OPTIONS Response:");
        print_buffer(gpo_data, format_mode);
        for entry in &app.afl {
            println!(
                "  AFL: SFI {} records {}-{} ({} for offline authentication)",
                entry.sfi, entry.first_record, entry.last_record, entry.offline_auth_records
            );
        }
    }

    // Records
    println!("\nRecords read: {}", app.aef.len());
    for aef in &app.aef {
        println!("\nSFI {} Record {}:", aef.afl.sfi, aef.record);

        // Check if record is wrapped in tag 70
        let search_data = find_tag(&aef.data, &[0x70]).unwrap_or(aef.data.as_slice());
        print_buffer(search_data, format_mode);
    }

    // GET DATA objects
    println!();
    if let Some(atc) = app.atc_value() {
        println!("Application Transaction Counter: {}", atc);
    }
    if let Some(atc) = app.last_online_atc_value() {
        println!("Last Online ATC Register: {}", atc);
    }
    if let Some(tries) = app.pin_tries_remaining() {
        println!("PIN Try Counter: {}", tries);
    }
    if let Some(log_entry) = &app.log_entry {
        println!("Log Entry: {}", hex::encode_upper(log_entry));
    }
    if let Some(log_format) = &app.log_format {
        println!("Log Format: {}", hex::encode_upper(log_format));
    }

    if let Some(err) = &app.failure {
        println!("Processing stopped: {}", err);
    }
    for anomaly in &app.anomalies {
        println!("Warning: {}", anomaly);
    }
    println!();
}

fn print_buffer(data: &[u8], format_mode: FormatMode) {
    if format_mode == FormatMode::Raw {
        println!("  Data ({} bytes): {}", data.len(), hex::encode_upper(data));
    } else {
        display_tags(data, &format_mode);
    }
}
