//! cborw CLI - Command-line tool for canonical CBOR encoding
//!
//! This binary provides command-line interfaces for:
//! - encode: convert a JSON document to CBOR
//! - compare: order two encoded map keys under a canonical profile

use cbor_codec::{compare_encoded, json_to_cbor, ContainerLayout, WriterOptions};
use cbor_format::{Conformance, Limits};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "cborw")]
#[command(about = "Canonical CBOR writer CLI tool")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON document to CBOR
    ///
    /// Examples:
    ///   cborw encode doc.json --conformance canonical
    ///   cat doc.json | cborw encode - -o doc.cbor --conformance ctap2
    Encode {
        /// Input JSON file, or "-" for stdin
        input: PathBuf,
        /// Output file; hex is printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Map key ordering rules
        #[arg(long, value_enum)]
        conformance: Option<ConformanceArg>,
        /// Use indefinite-length arrays and maps
        #[arg(long)]
        indefinite: bool,
        /// Write lowercase hex to the output file instead of raw bytes
        #[arg(long)]
        hex: bool,
        /// TOML file with default settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compare two hex-encoded keys under a canonical profile
    Compare {
        /// First key encoding (hex)
        left: String,
        /// Second key encoding (hex)
        right: String,
        /// Ordering profile
        #[arg(long, value_enum, default_value_t = ConformanceArg::Canonical)]
        conformance: ConformanceArg,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ConformanceArg {
    Lax,
    Canonical,
    Ctap2,
}

impl From<ConformanceArg> for Conformance {
    fn from(arg: ConformanceArg) -> Self {
        match arg {
            ConformanceArg::Lax => Conformance::Lax,
            ConformanceArg::Canonical => Conformance::Canonical,
            ConformanceArg::Ctap2 => Conformance::Ctap2Canonical,
        }
    }
}

/// Settings read from a `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    conformance: Option<ConformanceArg>,
    indefinite: Option<bool>,
    max_nesting_depth: Option<usize>,
    max_buffer_len: Option<usize>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&text)?;
        Ok(config)
    }

    /// Merge with command-line values; flags win over the file
    fn resolve(
        self,
        conformance: Option<ConformanceArg>,
        indefinite: bool,
    ) -> (WriterOptions, ContainerLayout) {
        let defaults = Limits::default();
        let opts = WriterOptions {
            conformance: conformance
                .or(self.conformance)
                .unwrap_or(ConformanceArg::Lax)
                .into(),
            limits: Limits {
                max_nesting_depth: self
                    .max_nesting_depth
                    .unwrap_or(defaults.max_nesting_depth),
                max_buffer_len: self.max_buffer_len.unwrap_or(defaults.max_buffer_len),
            },
            ..WriterOptions::default()
        };
        let layout = if indefinite || self.indefinite.unwrap_or(false) {
            ContainerLayout::Indefinite
        } else {
            ContainerLayout::Definite
        };
        (opts, layout)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            conformance,
            indefinite,
            hex,
            config,
        } => {
            handle_encode(input, output, conformance, indefinite, hex, config)?;
        }
        Commands::Compare {
            left,
            right,
            conformance,
        } => {
            handle_compare(&left, &right, conformance)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn handle_encode(
    input: PathBuf,
    output: Option<PathBuf>,
    conformance: Option<ConformanceArg>,
    indefinite: bool,
    hex: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let file_config = match &config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let (opts, layout) = file_config.resolve(conformance, indefinite);
    debug!(conformance = opts.conformance.name(), ?layout, "resolved settings");

    let value = read_json(&input)?;
    let bytes = json_to_cbor(&value, &opts, layout)?;
    info!(bytes = bytes.len(), "encoded document");

    match output {
        Some(path) if hex => fs::write(path, format!("{}\n", to_hex(&bytes)))?,
        Some(path) => fs::write(path, &bytes)?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", to_hex(&bytes))?;
        }
    }
    Ok(())
}

fn handle_compare(left: &str, right: &str, conformance: ConformanceArg) -> Result<(), Box<dyn Error>> {
    let conformance = Conformance::from(conformance);
    if !conformance.requires_key_ordering() {
        return Err("lax conformance defines no key order".into());
    }
    let left = parse_hex(left)?;
    let right = parse_hex(right)?;
    if left.is_empty() || right.is_empty() {
        return Err("keys must be at least one byte".into());
    }

    let verdict = match compare_encoded(&left, &right, conformance) {
        Ordering::Less => "less",
        Ordering::Equal => "equal",
        Ordering::Greater => "greater",
    };
    println!("{}", verdict);
    Ok(())
}

fn read_json(input: &Path) -> Result<Value, Box<dyn Error>> {
    let text = if input.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn parse_hex(text: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {:?}", text).into());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            Ok(u8::from_str_radix(pair, 16)?)
        })
        .collect()
}
