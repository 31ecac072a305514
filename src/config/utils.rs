// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, CONFIG_SCHEMA};
use crate::acquisition::{resolve_channel, validate_device_name};
use crate::utility::waveform::time_array;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./span_analyzer --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);
    Ok(())
}

/// Validates the configuration against rules the JSON schema cannot express.
///
/// # Validation Rules
///
/// - **Device**: the name is set and well formed, the sample rate is positive
/// - **Channels**: both sweep channels resolve against the device
/// - **Frequency range**: the start exponent is below the stop exponent
///   (equal only for a single point), and the highest frequency stays below
///   half the sample rate
/// - **Bandwidth**: positive and wider than the bin spacing of the
///   synthesized excitation, so every band holds a frequency bin
/// - **Buffers**: an excitation holds at least two samples
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let device = &config.device;
    validate_device_name(&device.name).context("Invalid device configuration")?;
    if device.sample_rate == 0 {
        anyhow::bail!("Invalid sample rate: {}", device.sample_rate);
    }

    let sweep = &config.sweep;
    for channel in [&sweep.write_channel, &sweep.read_channel] {
        resolve_channel(&device.name, channel)
            .with_context(|| format!("Invalid sweep channel '{}'", channel))?;
    }

    if sweep.points == 0 {
        anyhow::bail!("A sweep needs at least one point");
    }
    if sweep.points > 1 && sweep.start_exponent >= sweep.stop_exponent {
        anyhow::bail!(
            "Start exponent {} must be lower than stop exponent {}",
            sweep.start_exponent,
            sweep.stop_exponent
        );
    }

    let nyquist = device.sample_rate as f64 / 2.0;
    let highest = 10f64.powf(sweep.start_exponent.max(sweep.stop_exponent));
    if highest >= nyquist {
        anyhow::bail!(
            "Highest sweep frequency {} Hz must stay below half the sample rate ({} Hz)",
            highest,
            nyquist
        );
    }

    if !(sweep.bandwidth > 0.0) {
        anyhow::bail!("Bandwidth must be positive, got {}", sweep.bandwidth);
    }
    if !(sweep.duration > 0.0) {
        anyhow::bail!("Duration must be positive, got {}", sweep.duration);
    }
    // Excitation length as synthesized by the sweep driver
    let samples = time_array(sweep.duration, device.sample_rate)
        .context("Invalid sweep duration")?
        .len();
    if samples < 2 {
        anyhow::bail!(
            "Duration {} s holds fewer than two samples at {} Hz",
            sweep.duration,
            device.sample_rate
        );
    }
    let resolution = device.sample_rate as f64 / samples as f64;
    if 2.0 * sweep.bandwidth <= resolution {
        anyhow::bail!(
            "Bandwidth ±{} Hz is narrower than the frequency resolution of {} Hz",
            sweep.bandwidth,
            resolution
        );
    }

    if config.simulation.corner_angular_frequency <= 0.0 {
        debug!(
            "Non-positive corner frequency {} rad/s, the low-pass model will not pass any signal",
            config.simulation.corner_angular_frequency
        );
    }

    Ok(())
}
