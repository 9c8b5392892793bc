use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reference CLI for the mirrorlog append-only block store.
#[derive(Debug, Parser)]
#[command(name = "mirrorlog", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv). Overridden by RUST_LOG if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create (or reuse) a device file and format it with a fresh supersector.
    Init {
        /// Path to the backing file or block device.
        path: PathBuf,

        /// Number of 512-byte sectors to create the file with. Required
        /// when `path` does not already exist.
        #[arg(long)]
        sectors: Option<u32>,
    },

    /// Append one batch of payload bytes to the log.
    Append {
        /// Path to the backing file or block device.
        path: PathBuf,

        /// Caller-supplied tag byte stored in every sector of this batch.
        #[arg(long, value_parser = parse_u8)]
        header: u8,

        /// File whose contents are appended. Its length must be a multiple
        /// of 507 bytes (PAYLOAD_SIZE).
        #[arg(long)]
        input: PathBuf,
    },

    /// Recover the payload stream and dump it to payload.csv/meta.csv.
    Read {
        /// Path to the backing file or block device.
        path: PathBuf,

        /// Directory to write payload.csv and meta.csv into. Defaults to
        /// the current directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn parse_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u8>().map_err(|e| e.to_string())
    }
}
