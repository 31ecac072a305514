// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the span analyzer
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use span_analyzer::acquisition::{DaqSession, SimulatedBackend};
use span_analyzer::config::{self, Config};
use span_analyzer::spectral::{
    run_bode_sweep, simulate_bode_sweep, BodePlot, BodePlotter, BodeResponse, JsonPlotWriter,
};
use span_analyzer::utility::lti::LinearSystem;
use span_analyzer::utility::waveform::duration_to_samples;

/// Frequency response analyzer for DAQ-driven devices
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Output file for the Bode plot data (JSON)
    #[arg(long)]
    output: Option<PathBuf>,

    /// DAQ device name
    #[arg(long)]
    device: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Decade exponent of the first sweep frequency
    #[arg(long, allow_hyphen_values = true)]
    start_exponent: Option<f64>,

    /// Decade exponent of the last sweep frequency
    #[arg(long, allow_hyphen_values = true)]
    stop_exponent: Option<f64>,

    /// Number of sweep frequencies
    #[arg(long)]
    points: Option<usize>,

    /// Half-width in Hz of the band integrated around every frequency
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Compute the response of the configured model offline instead of
    /// sweeping the simulated DAQ
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    config.apply_args(
        args.device.clone(),
        args.sample_rate,
        args.start_exponent,
        args.stop_exponent,
        args.points,
        args.bandwidth,
    );
    config::validate_specific_rules(&config).context("Invalid command line overrides")?;

    let system = config.simulation.system();
    let response = if args.simulate {
        run_offline(&config, system.as_ref())?
    } else {
        run_simulated_daq(&config, system.clone())?
    };

    print_table(&response);

    if let Some(output_path) = args.output {
        let plot = BodePlot::from_response(&response, Some(system.as_ref()));
        JsonPlotWriter::new(&output_path).render(&plot)?;
    }

    Ok(())
}

fn run_offline(config: &Config, system: &dyn LinearSystem) -> Result<BodeResponse> {
    let rate = config.device.sample_rate;
    let samples = duration_to_samples(rate, config.sweep.duration);
    info!(
        "Simulating {:?} offline with {} samples at {} Hz",
        system, samples, rate
    );

    simulate_bode_sweep(
        system,
        rate,
        samples,
        config.sweep.bandwidth,
        &config.sweep.frequencies(),
    )
    .context("Offline simulation failed")
}

fn run_simulated_daq(
    config: &Config,
    system: std::sync::Arc<dyn LinearSystem>,
) -> Result<BodeResponse> {
    let device = &config.device;
    let sweep = &config.sweep;
    let simulation = &config.simulation;

    let backend = SimulatedBackend::new(device.name.clone())
        .connect(
            local_channel(&device.name, &sweep.write_channel),
            local_channel(&device.name, &sweep.read_channel),
            system,
        )?
        .with_noise(simulation.noise_amplitude, simulation.seed)?;
    let mut session = DaqSession::new(backend, device)?;
    println!("{}\n", session);

    let response = run_bode_sweep(&mut session, &sweep.settings(), &sweep.frequencies())?;
    info!(
        "Sweep finished, {} tasks created, {} still open",
        session.backend().created_tasks(),
        session.backend().open_tasks()
    );
    Ok(response)
}

/// Channel name without its device prefix
fn local_channel<'a>(device: &str, channel: &'a str) -> &'a str {
    channel
        .strip_prefix(device)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(channel)
}

fn print_table(response: &BodeResponse) {
    println!("{:>14} {:>14} {:>12} {:>12}", "f (Hz)", "power", "gain (dB)", "phase (°)");
    for (sample, db) in response.samples().iter().zip(response.magnitudes_db()) {
        println!(
            "{:>14.4} {:>14.6e} {:>12.3} {:>12.2}",
            sample.frequency,
            sample.power,
            db,
            sample.phase.to_degrees()
        );
    }
}
