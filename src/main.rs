// src/main.rs
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use huffpack::adaptive::{self, AdaptiveConfig};
use huffpack::block::{self, BlockConfig};
use huffpack::container::Policy;
use huffpack::{Error, Result, logger};

/// Reserved extension for block-mode artifacts.
const BLOCK_EXT: &str = "huff";
/// Reserved extension for adaptive-mode artifacts.
const STREAM_EXT: &str = "huff_a";

#[derive(Parser)]
#[command(name = "huffpack", version)]
#[command(about = "Huffman file compressor with static and adaptive modes.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum PolicyArg {
    #[clap(help = "Rebuild the code table once at the first threshold, then keep it.")]
    Freeze,
    #[clap(help = "Rebuild at every threshold from cumulative counts (Default).")]
    Reconstruct,
    #[clap(help = "Halve saturated counts before each rebuild.")]
    Normalize,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    Encode {
        source: PathBuf,
        /// Defaults to the source path with the mode extension appended
        #[arg(short, long)]
        destination: Option<PathBuf>,
        /// Use the adaptive (streaming) mode instead of the static one
        #[arg(short, long)]
        adaptive: bool,
        /// Symbol width in bits (static mode)
        #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=16))]
        byte_size: u8,
        /// Rebuild threshold exponent: the model updates every 2^n symbols (adaptive mode)
        #[arg(short = 'n', long, default_value_t = 11, value_parser = clap::value_parser!(u8).range(..=15))]
        threshold_exp: u8,
        /// Model update policy (adaptive mode)
        #[arg(long, value_enum, default_value_t = PolicyArg::Reconstruct)]
        policy: PolicyArg,
    },
    /// Decompress a file; the mode is inferred from the source extension
    Decode {
        source: PathBuf,
        /// Defaults to the source path with its extension stripped
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Encode {
            source,
            destination,
            adaptive,
            byte_size,
            threshold_exp,
            policy,
        } => {
            let policy = match policy {
                PolicyArg::Freeze => Policy::Freeze,
                PolicyArg::Reconstruct => Policy::Reconstruct,
                PolicyArg::Normalize => Policy::Normalize,
            };
            run_encode(&source, destination, adaptive, byte_size, threshold_exp, policy)
        }
        Commands::Decode {
            source,
            destination,
        } => run_decode(&source, destination),
    }
}

fn run_encode(
    source: &Path,
    destination: Option<PathBuf>,
    adaptive: bool,
    byte_size: u8,
    threshold_exp: u8,
    policy: Policy,
) -> Result<()> {
    let ext = if adaptive { STREAM_EXT } else { BLOCK_EXT };
    let destination = match destination {
        Some(path) => {
            if path.extension().and_then(OsStr::to_str) != Some(ext) {
                return Err(Error::Config(format!(
                    "destination {} must end in .{ext} for this mode",
                    path.display()
                )));
            }
            path
        }
        None => append_extension(source, ext),
    };

    if adaptive {
        let config = AdaptiveConfig::new(threshold_exp, policy)?;
        let reader = BufReader::new(File::open(source)?);
        let writer = BufWriter::new(File::create(&destination)?);
        adaptive::encode(reader, writer, &config)?;
    } else {
        let config = BlockConfig::new(byte_size)?;
        let data = fs::read(source)?;
        let encoded = block::encode(&data, &config)?;
        fs::write(&destination, &encoded)?;
    }

    let original = fs::metadata(source)?.len();
    let encoded = fs::metadata(&destination)?.len();
    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        original_bytes = original,
        encoded_bytes = encoded,
        "encoded"
    );
    Ok(())
}

fn run_decode(source: &Path, destination: Option<PathBuf>) -> Result<()> {
    let adaptive = match source.extension().and_then(OsStr::to_str) {
        Some(BLOCK_EXT) => false,
        Some(STREAM_EXT) => true,
        _ => {
            return Err(Error::Config(format!(
                "source {} must end in .{BLOCK_EXT} or .{STREAM_EXT} for decoding",
                source.display()
            )));
        }
    };
    let destination = destination.unwrap_or_else(|| source.with_extension(""));

    if adaptive {
        let reader = BufReader::new(File::open(source)?);
        let writer = BufWriter::new(File::create(&destination)?);
        adaptive::decode(reader, writer)?;
    } else {
        let data = fs::read(source)?;
        let decoded = block::decode(&data)?;
        fs::write(&destination, &decoded)?;
    }

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        "decoded"
    );
    Ok(())
}

/// `file.txt` -> `file.txt.huff`; unlike `Path::with_extension`, the
/// original extension survives so decoding can restore the name.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
