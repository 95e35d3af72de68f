use clap::{Parser, Subcommand};
use emv_card::{SessionConfig, TerminalData, UnpredictableNumber};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatters;
use formatters::FormatMode;

#[derive(Parser)]
#[command(name = "emv-reader")]
#[command(about = "EMV Card Reader - Discover and read payment applications")]
#[command(version)]
struct Args {
    /// Reader name to use (first reader if not specified)
    #[arg(short, long, global = true)]
    reader: Option<String>,

    /// Output format mode
    #[arg(short, long, value_enum, default_value_t = FormatMode::Raw, global = true)]
    format: FormatMode,

    /// Do not probe known AIDs when the card has no payment directory
    #[arg(long, global = true)]
    no_brute_force: bool,

    /// Send a random Unpredictable Number instead of the fixed one
    #[arg(long, global = true)]
    random_un: bool,

    /// Directory records that may fail before misses are counted
    #[arg(long, default_value_t = 5, global = true)]
    directory_slack: u8,

    /// Consecutive directory record misses that end enumeration
    #[arg(long, default_value_t = 5, global = true)]
    directory_misses: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List available readers
    Readers,
    /// Read every application and print a report (default)
    Info,
    /// Dump every collected buffer as a decoded TLV tree
    Dump,
    /// Print the label of the first application
    Type,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let terminal = TerminalData {
            unpredictable_number: if self.random_un {
                UnpredictableNumber::Random
            } else {
                TerminalData::default().unpredictable_number
            },
            ..TerminalData::default()
        };

        SessionConfig::default()
            .with_brute_force(!self.no_brute_force)
            .with_directory_record_slack(self.directory_slack)
            .with_directory_max_misses(self.directory_misses)
            .with_terminal(terminal)
    }
}

fn main() {
    // Initialize tracing subscriber with environment-based filtering
    // Set RUST_LOG=debug for every APDU, RUST_LOG=trace for responses too
    // Default: info level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = args.session_config();
    let reader = args.reader.as_deref();

    match args.command.unwrap_or(Command::Info) {
        Command::Readers => commands::readers::cmd_readers(),
        Command::Info => commands::info::cmd_info(reader, config, args.format),
        Command::Dump => commands::dump::cmd_dump(reader, config),
        Command::Type => commands::card_type::cmd_type(reader, config),
    }
}
