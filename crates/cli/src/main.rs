use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

mod commands;
mod config;

use commands::*;

#[derive(Parser)]
#[command(version, about = "Toolbox for eCard APDUs, signature sequences, PIN flows and certificate chains")]
struct Cli {
    /// Configuration file (TOML), overridden by ECARD_* environment variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug level output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// BER-TLV encoding and decoding
    #[command(subcommand)]
    Tlv(TlvCommands),

    /// Command APDU framing and status word lookup
    #[command(subcommand)]
    Apdu(ApduCommands),

    /// Run a CryptoMarker against a simulated card and print the exchanged APDUs
    Sign {
        /// CryptoMarker as JSON
        #[arg(long)]
        marker: PathBuf,

        /// Message or hash to sign, hex
        #[arg(long)]
        message: HexArg,

        /// Slot handle, hex
        #[arg(long, default_value = "00")]
        slot: HexArg,

        /// The key belongs to the selected application
        #[arg(long)]
        local: bool,

        /// Signature the simulated card returns, hex
        #[arg(long, default_value = "")]
        card_signature: HexArg,
    },

    /// Walk the PIN/CAN retry flow against scripted PACE status words
    Pin {
        /// Retry counter reported by the card
        #[arg(long, default_value_t = 3)]
        remaining: u8,

        /// PIN typed by the user
        #[arg(long)]
        pin: Option<String>,

        /// CAN typed by the user
        #[arg(long)]
        can: Option<String>,

        /// Secrets are captured by the reader
        #[arg(long, conflicts_with_all = ["pin", "can"])]
        pin_pad: bool,

        /// Status words the card answers with, in order
        #[arg(required = true)]
        responses: Vec<HexArg>,
    },

    /// Verify a certificate chain against the configured trust anchors
    Verify {
        /// Host name the chain was presented for
        #[arg(long)]
        hostname: String,

        /// Certificate files, leaf first, DER or PEM
        #[arg(required = true)]
        chain: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TlvCommands {
    /// Decode one or more TLVs
    Decode {
        /// Encoded TLVs, hex
        input: HexArg,
    },
    /// Encode a value under a tag
    Encode {
        /// Tag bytes, hex
        tag: HexArg,
        /// Value bytes, hex (children for constructed tags)
        #[arg(default_value = "")]
        value: HexArg,
    },
}

#[derive(Subcommand)]
enum ApduCommands {
    /// Split a command APDU into its fields
    Parse {
        /// Command APDU, hex
        input: HexArg,
    },
    /// Build a short-form command APDU
    Frame {
        /// Class byte
        #[arg(value_parser = parse_byte)]
        cla: u8,
        /// Instruction byte
        #[arg(value_parser = parse_byte)]
        ins: u8,
        /// First parameter
        #[arg(value_parser = parse_byte)]
        p1: u8,
        /// Second parameter
        #[arg(value_parser = parse_byte)]
        p2: u8,
        /// Data field, hex
        #[arg(long)]
        data: Option<HexArg>,
        /// Expected length
        #[arg(long, value_parser = parse_byte)]
        le: Option<u8>,
    },
    /// Explain a status word
    Status {
        /// SW1 SW2, hex
        status: HexArg,
    },
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    match &cli.command {
        Commands::Tlv(TlvCommands::Decode { input }) => tlv_decode_command(input)?,
        Commands::Tlv(TlvCommands::Encode { tag, value }) => tlv_encode_command(tag, value)?,
        Commands::Apdu(ApduCommands::Parse { input }) => parse_command(input)?,
        Commands::Apdu(ApduCommands::Frame {
            cla,
            ins,
            p1,
            p2,
            data,
            le,
        }) => frame_command([*cla, *ins, *p1, *p2], data.as_ref(), *le)?,
        Commands::Apdu(ApduCommands::Status { status }) => status_command(status)?,
        Commands::Sign {
            marker,
            message,
            slot,
            local,
            card_signature,
        } => sign_command(
            SignArgs {
                marker,
                message,
                slot,
                local: *local,
                card_signature,
            },
            config.sequencer,
        )?,
        Commands::Pin {
            remaining,
            pin,
            can,
            pin_pad,
            responses,
        } => pin_command(
            PinArgs {
                remaining: *remaining,
                pin: pin.as_deref(),
                can: can.as_deref(),
                pin_pad: *pin_pad,
                responses,
            },
            config.pin,
        )?,
        Commands::Verify { hostname, chain } => verify_command(&config.trust, chain, hostname)?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .init();
}
