// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the span analyzer
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! - `device`: DAQ device name and sample clock
//! - `sweep`: excitation waveform, frequency range and analysis bandwidth
//! - `simulation`: model of the device under test used by the simulated DAQ
//!
//! ## Usage
//!
//! ```no_run
//! use span_analyzer::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("myDAQ2".to_string()), // Device
//!     Some(100_000),              // Sample rate
//!     None,                       // Start exponent
//!     Some(3.0),                  // Stop exponent
//!     Some(31),                   // Points
//!     None,                       // Bandwidth
//! );
//!
//! println!("Sweeping {} points", config.sweep.points);
//! ```

pub mod device;
pub mod simulation;
pub mod sweep;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use device::DeviceConfig;
pub use simulation::{SimulationConfig, SystemModel};
pub use sweep::SweepConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// JSON schema every configuration file is validated against
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// Every section falls back to its defaults when missing from the file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// DAQ device settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Bode sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Simulated device under test.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file
    /// failing validation leaves a `<name>.sample.yaml` with the defaults
    /// next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the values that are provided replace the loaded ones.
    ///
    /// # Parameters
    ///
    /// * `device` - DAQ device name
    /// * `sample_rate` - Sample clock rate in Hz
    /// * `start_exponent` - Decade exponent of the first sweep frequency
    /// * `stop_exponent` - Decade exponent of the last sweep frequency
    /// * `points` - Number of sweep frequencies
    /// * `bandwidth` - Half-width of the power integration band in Hz
    pub fn apply_args(
        &mut self,
        device: Option<String>,
        sample_rate: Option<u32>,
        start_exponent: Option<f64>,
        stop_exponent: Option<f64>,
        points: Option<usize>,
        bandwidth: Option<f64>,
    ) {
        if let Some(device) = device {
            debug!("Overriding device from command line: {}", device);
            self.device.name = device;
        }
        if let Some(rate) = sample_rate {
            debug!("Overriding sample rate from command line: {}", rate);
            self.device.sample_rate = rate;
        }
        if let Some(start) = start_exponent {
            debug!("Overriding start exponent from command line: {}", start);
            self.sweep.start_exponent = start;
        }
        if let Some(stop) = stop_exponent {
            debug!("Overriding stop exponent from command line: {}", stop);
            self.sweep.stop_exponent = stop;
        }
        if let Some(points) = points {
            debug!("Overriding sweep points from command line: {}", points);
            self.sweep.points = points;
        }
        if let Some(bandwidth) = bandwidth {
            debug!("Overriding bandwidth from command line: {}", bandwidth);
            self.sweep.bandwidth = bandwidth;
        }
    }
}
