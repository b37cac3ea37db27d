// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Command-line front end for the streaming FFT engine.
//!
//! Reads complex samples as JSON lines, streams them through the engine one
//! window at a time and writes the transformed samples back out as JSON
//! lines. Engine configuration comes from the `[sdfft]` section of
//! `sdfft-rs.toml` (or a file given with `--config`), with a couple of
//! common overrides available as flags.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sdfft_core::{Direction, FftParams, Float64Kernel, Frame, SdfFft};

mod records;

type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Parser)]
#[command(
    name = "sdfft-cli",
    about = "Stream complex samples through the delay-feedback FFT engine"
)]
struct Args {
    /// Config file with an [sdfft] section.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input JSON-lines file, '-' for stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// Output JSON-lines file, '-' for stdout.
    #[arg(long, default_value = "-")]
    output: String,

    /// Override the configured transform size.
    #[arg(long)]
    size: Option<usize>,

    /// Run the inverse transform.
    #[arg(long)]
    inverse: bool,
}

/// `[sdfft]` section of `sdfft-rs.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    /// Log level (trace, debug, info, warn, error).
    log_level: Option<String>,
    /// Engine configuration.
    engine: FftParams,
}

/// Extract and deserialize the `[sdfft]` section from a TOML file.
fn load_config(path: &Path) -> DynResult<CliConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| format!("failed to parse config file {}: {e}", path.display()))?;
    let Some(section) = table.get("sdfft") else {
        return Err(format!("missing [sdfft] section in {}", path.display()).into());
    };
    // Re-serialize the section then parse as CliConfig so serde defaults
    // apply.
    let section_toml = toml::to_string(section)?;
    Ok(toml::from_str(&section_toml)?)
}

fn init_logging(log_level: Option<&str>) {
    let level = log_level
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_samples(input: &str) -> DynResult<Vec<Complex<f64>>> {
    let content = match input {
        "-" => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        path => fs::read_to_string(path)?,
    };
    let mut samples = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let sample = records::parse_sample(line)
            .map_err(|e| format!("input line {}: {e}", lineno + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Push one window through the engine at full throughput.
fn transform_window(
    engine: &mut SdfFft<Float64Kernel>,
    window: &[Complex<f64>],
) -> Vec<Complex<f64>> {
    let n = window.len();
    let mut fed = 0;
    let mut outs = Vec::with_capacity(n);
    loop {
        let offer = (fed < n).then(|| Frame::new(window[fed], fed + 1 == n));
        let result = engine.step(offer, true);
        if result.accepted {
            fed += 1;
        }
        if let Some(frame) = result.output {
            outs.push(frame.sample);
            if frame.last {
                return outs;
            }
        }
    }
}

fn run(args: Args) -> DynResult<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let default = Path::new("sdfft-rs.toml");
            if default.exists() {
                load_config(default)?
            } else {
                CliConfig::default()
            }
        }
    };
    init_logging(config.log_level.as_deref());

    let mut params = config.engine;
    if let Some(size) = args.size {
        params.size = size;
    }
    if args.inverse {
        params.direction = Direction::Inverse;
    }

    let mut engine = SdfFft::<Float64Kernel>::new(params)?;
    let size = engine.size();
    info!(
        size,
        latency = engine.latency(),
        direction = ?engine.params().direction,
        "engine ready"
    );

    let samples = read_samples(&args.input)?;
    let windows = samples.len() / size;
    let remainder = samples.len() % size;
    if remainder != 0 {
        warn!(
            remainder,
            "input is not a whole number of windows; trailing samples dropped"
        );
    }

    let mut sink: BufWriter<Box<dyn Write>> = BufWriter::new(match args.output.as_str() {
        "-" => Box::new(io::stdout()),
        path => Box::new(fs::File::create(path)?),
    });
    for window in samples[..windows * size].chunks(size) {
        for sample in transform_window(&mut engine, window) {
            writeln!(sink, "{}", records::format_sample(sample)?)?;
        }
    }
    sink.flush()?;
    info!(windows, "stream complete");
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("sdfft-cli: {e}");
        std::process::exit(1);
    }
}
