mod logger;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, error, warn};
use scte35_codec::text::{TextError, TextFormat, decode_text, encode_text};
use scte35_codec::{
    BreakDuration, DecodeError, DecodeOptions, EncodeError, SpliceCommand, SpliceInfoSection,
    SpliceInsert, decode_with, encode,
};
use serde_json::json;
use std::process;
use std::time::Duration;
use thiserror::Error;

/// Decode and encode SCTE-35 cues.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Decode a base64 or hex cue and print its fields.
    Decode(DecodeArgs),
    /// Build an out-of-network splice_insert cue.
    Encode(EncodeArgs),
}

#[derive(Debug, Clone, Args)]
struct DecodeArgs {
    /// Cue as base64 or hex text.
    payload: String,

    #[arg(short, long, value_enum, default_value_t = TextFormat::Auto)]
    format: TextFormat,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Fail on descriptors that cannot be interpreted.
    #[arg(long)]
    strict: bool,

    /// Show a cue whose CRC-32 does not match instead of failing.
    #[arg(long)]
    accept_crc_mismatch: bool,
}

#[derive(Debug, Clone, Args)]
struct EncodeArgs {
    #[arg(long)]
    event_id: u32,

    /// Break duration in seconds.
    #[arg(long)]
    duration: f64,

    /// Splice point in 90 kHz ticks.
    #[arg(long)]
    pts_time: u64,

    #[arg(short, long, value_enum, default_value_t = TextFormat::Base64)]
    format: TextFormat,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("could not read payload: {0}")]
    Text(#[from] TextError),

    #[error("could not decode cue: {0}")]
    Decode(#[from] DecodeError),

    #[error("could not encode cue: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid duration {0}: must be a finite number of seconds, not negative")]
    Duration(f64),
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let (result, output) = match &cli.command {
        Command::Decode(args) => (run_decode(args), args.output),
        Command::Encode(args) => (run_encode(args), args.output),
    };

    if let Err(err) = result {
        match output {
            OutputFormat::Json => {
                println!("{}", json!({ "status": "error", "error": err.to_string() }))
            }
            OutputFormat::Text => error!("{err}"),
        }
        process::exit(1);
    }
}

fn run_decode(args: &DecodeArgs) -> Result<(), CliError> {
    let bytes = decode_text(&args.payload, args.format)?;
    debug!("decoding {} bytes", bytes.len());

    let options = DecodeOptions::default().strict_descriptors(args.strict);
    let (section, crc_valid) = match decode_with(&bytes, &options) {
        Ok(section) => (section, true),
        Err(DecodeError::CrcMismatch {
            computed,
            declared,
            section: Some(section),
        }) if args.accept_crc_mismatch => {
            warn!("CRC-32 mismatch: computed 0x{computed:08x}, declared 0x{declared:08x}");
            (*section, false)
        }
        Err(err) => return Err(err.into()),
    };

    match args.output {
        OutputFormat::Json => {
            let document = json!({
                "status": "success",
                "data": section,
                "crc": { "valid": crc_valid },
                "descriptor_issues": section.descriptor_issues(),
            });
            println!("{document:#}");
        }
        OutputFormat::Text => {
            println!("{section}");
            println!("  CRC Valid: {crc_valid}");
            for issue in section.descriptor_issues() {
                println!("  Descriptor Issue (tag 0x{:02x}): {}", issue.tag, issue.issue);
            }
        }
    }
    Ok(())
}

fn run_encode(args: &EncodeArgs) -> Result<(), CliError> {
    let duration = Duration::try_from_secs_f64(args.duration)
        .map_err(|_| CliError::Duration(args.duration))?;
    let break_duration = BreakDuration::from_duration(duration, true)?;

    let insert =
        SpliceInsert::out_of_network(args.event_id, args.pts_time, break_duration.duration);
    let section = SpliceInfoSection::new(SpliceCommand::SpliceInsert(insert));
    let bytes = encode(&section)?;

    let format = match args.format {
        TextFormat::Hex => TextFormat::Hex,
        TextFormat::Auto | TextFormat::Base64 => TextFormat::Base64,
    };
    let text = encode_text(&bytes, format);
    match args.output {
        OutputFormat::Json => {
            println!(
                "{:#}",
                json!({ "scte35_string": text, "format": format.to_string() })
            )
        }
        OutputFormat::Text => println!("{text}"),
    }
    Ok(())
}
