// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Waveform generator for offline testing
// Writes a synthesized excitation to a 32-bit float WAV file

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use span_analyzer::utility::noise_generator::NoiseGenerator;
use span_analyzer::utility::wav::write_channels;
use span_analyzer::utility::waveform::{generate_waveform, WaveformDescriptor, WaveformKind};

/// Waveform generator for offline testing
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output file path (.wav)
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Waveform shape: sine, square, sawtooth, isawtooth or triangle
    #[arg(short, long, default_value = "sine")]
    waveform: WaveformKind,

    /// Frequency in Hz
    #[arg(short, long, default_value_t = 1000.0)]
    frequency: f64,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 48000)]
    sample_rate: u32,

    /// Peak amplitude in volts
    #[arg(short, long, default_value_t = 1.0)]
    amplitude: f64,

    /// Phase in degrees
    #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    phase: f64,

    /// Duration in seconds
    #[arg(short, long, default_value_t = 1.0)]
    duration: f64,

    /// Standard deviation of Gaussian noise added to the waveform, in volts
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Seed of the noise generator (system time when omitted)
    #[arg(long)]
    seed: Option<u32>,

    /// Also write the clean waveform as a second channel, usable as reference
    #[arg(long, default_value_t = false)]
    reference: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    let args = Args::parse();

    if args.noise < 0.0 {
        anyhow::bail!("Noise standard deviation must not be negative");
    }

    let descriptor = WaveformDescriptor {
        kind: args.waveform,
        sample_rate: args.sample_rate,
        frequency: args.frequency,
        amplitude: args.amplitude,
        phase: args.phase,
        duration: args.duration,
    };
    let (_, clean) = generate_waveform(&descriptor)?;

    info!(
        "Generating {} samples of {} at {} Hz (sample rate {} Hz)",
        clean.len(),
        args.waveform,
        args.frequency,
        args.sample_rate
    );

    let mut signal = clean.clone();
    if args.noise > 0.0 {
        let mut generator = match args.seed {
            Some(seed) => NoiseGenerator::new(seed),
            None => NoiseGenerator::new_from_system_time(),
        };
        generator.add_to(&mut signal, args.noise);
        info!("Added Gaussian noise with σ = {} V", args.noise);
    }

    if args.reference {
        write_channels(&args.output, args.sample_rate, &[&signal, &clean])?;
    } else {
        write_channels(&args.output, args.sample_rate, &[&signal])?;
    }

    println!(
        "Waveform successfully generated and saved to: {}",
        args.output.display()
    );
    Ok(())
}
