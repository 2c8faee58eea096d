//! `docsync`: decode document records and diff change batches.
//!
//! Usage:
//!   docsync [--config FILE] decode --document users/u1 [--field avatar.url] [INPUT]
//!   docsync [--config FILE] diff [INPUT]
//!
//! Input is read from stdin when no file is given. Output is JSON on
//! stdout; logs go to stderr.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docsync::cli::{decode_json, diff_json, init_tracing, CliError};
use docsync::config::SyncConfig;
use docsync::decode::{Capabilities, DecodeContext, PathResolver};

#[derive(Debug, Parser)]
#[command(name = "docsync", version, about = "Decode document records and diff change batches")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Print compact JSON instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a record, or one field of it
    Decode {
        /// Path of the document the record belongs to
        #[arg(short, long)]
        document: String,
        /// Dotted field path to decode instead of the whole record
        #[arg(short, long)]
        field: Option<String>,
        input: Option<PathBuf>,
    },
    /// Diff a change batch
    Diff { input: Option<PathBuf> },
}

fn read_input(path: Option<&PathBuf>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = SyncConfig::load(args.config.as_deref())?;
    init_tracing(&config.logging)?;

    let context = DecodeContext::new(
        Capabilities::new()
            .with_resolver(std::sync::Arc::new(PathResolver::for_database(
                config.database.as_str(),
            )))
            .with_max_depth(config.decode.max_depth),
    );

    let output = match &args.command {
        Command::Decode {
            document,
            field,
            input,
        } => decode_json(&read_input(input.as_ref())?, document, field.as_deref(), &context)?,
        Command::Diff { input } => diff_json(&read_input(input.as_ref())?, &context)?,
    };

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("docsync: {e}");
        std::process::exit(1);
    }
}
