//! # mseed-pack
//!
//! Pack a file of sample values into a miniSEED file.
//!
//! ```bash
//! # 32-bit integers, one or more per line
//! mseed-pack --station-id XX.STA.00.BHZ --start-time 2025-01-01T00:00:00 \
//!     --sample-rate 100 --encoding 3 counts.txt out.mseed
//!
//! # Text log record, miniSEED v3
//! mseed-pack --station-id FDSN:XX_STA__L_O_G --start-time 2025-001 \
//!     --encoding 0 --format v3 notes.txt log.mseed
//! ```
//!
//! The process exits with the packing status code.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::info;

use mseed_pack::{
    EncodingFormat, FormatVersion, PackOptions, PackRequest, WriteMode, init_logging, pack,
};

/// mseed-pack - pack sample values into miniSEED records
#[derive(Parser)]
#[command(name = "mseed-pack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sample file: raw text for encoding 0, whitespace-separated numbers otherwise
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output miniSEED file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Station id (NET.STA.LOC.CHA or FDSN:NET_STA_LOC_B_S_SS)
    #[arg(short, long)]
    station_id: String,

    /// Start time of the first sample, e.g. 2025-01-01T00:00:00.5
    #[arg(short = 't', long)]
    start_time: String,

    /// Samples per second
    #[arg(short = 'r', long, default_value = "1.0")]
    sample_rate: f64,

    /// Encoding code: 0 text, 1 int16, 3 int32, 4 float32, 5 float64
    #[arg(short, long, default_value = "3")]
    encoding: u8,

    /// Record length in bytes (0 for the default of 4096)
    #[arg(short = 'l', long, default_value = "0")]
    record_length: i32,

    /// Byte order of v2 records
    #[arg(short, long, value_enum, default_value = "big")]
    byte_order: ByteOrderArg,

    /// Publication version
    #[arg(short, long, default_value = "1")]
    pub_version: u8,

    /// TOML file with packing options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// miniSEED format version (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Append to OUTPUT instead of replacing it
    #[arg(long)]
    append: bool,

    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ByteOrderArg {
    Little,
    Big,
}

impl ByteOrderArg {
    fn flag(self) -> i32 {
        match self {
            ByteOrderArg::Little => 0,
            ByteOrderArg::Big => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    V2,
    V3,
}

impl From<FormatArg> for FormatVersion {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::V2 => FormatVersion::V2,
            FormatArg::V3 => FormatVersion::V3,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        // -1 surfaces as 255
        Ok(status) => ExitCode::from(status as u8),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let mut options = match &cli.config {
        Some(path) => PackOptions::from_file(path)?,
        None => PackOptions::default(),
    };
    if let Some(format) = cli.format {
        options.format_version = format.into();
    }
    if cli.append {
        options.mode = WriteMode::Append;
    }
    options.verbosity = options.verbosity.max(cli.verbose);

    let (data, count) = read_samples(&cli.input, cli.encoding)?;
    info!("read {count} samples from {}", cli.input.display());

    let request = PackRequest::new(cli.encoding, &data, count)
        .with_station_id(&cli.station_id)
        .with_start_time(&cli.start_time)
        .with_sample_rate(cli.sample_rate)
        .with_record_length(cli.record_length)
        .with_byte_order(cli.byte_order.flag())
        .with_publication_version(cli.pub_version);

    match pack(&request, &cli.output, &options) {
        Ok(records) => {
            info!("wrote {records} records to {}", cli.output.display());
            Ok(0)
        }
        Err(e) => Ok(e.status()),
    }
}

/// Load `path` as native-endian elements of `encoding`.
fn read_samples(path: &Path, encoding: u8) -> Result<(Vec<u8>, usize)> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read sample file: {}", path.display()))?;

    // Unknown codes are left for the packer to reject
    let Ok(format) = EncodingFormat::from_code(encoding) else {
        return Ok((Vec::new(), 0));
    };
    let parse: fn(&str) -> Option<Vec<u8>> = match format {
        EncodingFormat::Text => {
            let count = content.len();
            return Ok((content, count));
        }
        EncodingFormat::Int16 => |t: &str| t.parse::<i16>().ok().map(|v| v.to_ne_bytes().to_vec()),
        EncodingFormat::Int32 => |t: &str| t.parse::<i32>().ok().map(|v| v.to_ne_bytes().to_vec()),
        EncodingFormat::Float32 => |t: &str| t.parse::<f32>().ok().map(|v| v.to_ne_bytes().to_vec()),
        EncodingFormat::Float64 => |t: &str| t.parse::<f64>().ok().map(|v| v.to_ne_bytes().to_vec()),
    };

    let text = String::from_utf8(content)
        .with_context(|| format!("Sample file is not UTF-8: {}", path.display()))?;
    let mut data = Vec::new();
    let mut count = 0;
    for token in text.split_whitespace() {
        let Some(bytes) = parse(token) else {
            bail!("Invalid {format} sample {token:?} in {}", path.display());
        };
        data.extend_from_slice(&bytes);
        count += 1;
    }
    Ok((data, count))
}
