// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Signal Analyzer
//!
//! A simple command-line tool reporting power and phase of a WAV recording
//! at one frequency. Channel 0 is the response; when present, channel 1 is
//! used as the reference input and the results become a power ratio and a
//! phase difference.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use span_analyzer::spectral::BodeAnalyzer;
use span_analyzer::utility::wav::read_channels;

#[derive(Parser)]
#[command(name = "analyze_signal")]
#[command(about = "Measure power and phase of a WAV file at a target frequency")]
struct Args {
    /// Input WAV file to analyze
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Target frequency (in Hz)
    #[arg(short, long, default_value_t = 1000.0)]
    target_frequency: f64,

    /// Half-width of the integration band (±Hz)
    #[arg(short, long, default_value_t = 1.0)]
    bandwidth: f64,

    /// Phase offset subtracted from the result, in radians
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    phase_offset: f64,

    /// Ignore channel 1 even when the file has one
    #[arg(long, default_value_t = false)]
    no_reference: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let signals = read_channels(&args.input)?;
    let output = signals
        .channels
        .first()
        .context("WAV file has no channel")?;
    let input = if args.no_reference {
        None
    } else {
        signals.channels.get(1)
    };

    println!("Analyzing: {}", args.input.display());
    println!("  Sample rate: {} Hz", signals.sample_rate);
    println!("  Channels: {}", signals.channels.len());
    println!(
        "  Duration: {:.3} seconds ({} samples)",
        output.len() as f64 / signals.sample_rate as f64,
        output.len()
    );
    println!(
        "  Reference: {}",
        if input.is_some() { "channel 1" } else { "none" }
    );
    println!();

    let analyzer = BodeAnalyzer::from_slices(
        signals.sample_rate,
        output,
        input.map(Vec::as_slice),
    )?;
    let sample = analyzer.sample(args.target_frequency, args.bandwidth, args.phase_offset)?;

    println!("Results at {} Hz (±{} Hz):", sample.frequency, args.bandwidth);
    if analyzer.has_reference() {
        println!("  Power ratio: {:.6e}", sample.power);
        println!("  Gain: {:.3} dB", 10.0 * sample.power.log10());
    } else {
        println!("  Power: {:.6e}", sample.power);
    }
    println!(
        "  Phase: {:.6} rad ({:.2}°)",
        sample.phase,
        sample.phase.to_degrees()
    );

    Ok(())
}
