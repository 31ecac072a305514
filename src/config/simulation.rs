// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated device under test

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utility::lti::{FirstOrderLowPass, Gain, LinearSystem};

/// Model placed between the simulated output and input
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SystemModel {
    /// `gain · ωc / (ωc + jω)`
    #[default]
    LowPass,
    /// Frequency-independent `gain`
    Gain,
}

/// Configuration of the simulated device under test.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationConfig {
    pub model: SystemModel,

    /// Corner angular frequency of the low-pass model in rad/s.
    pub corner_angular_frequency: f64,

    /// Static gain of the model.
    pub gain: f64,

    /// Standard deviation in volts of the noise added to every read.
    /// Zero disables noise.
    pub noise_amplitude: f64,

    /// Seed of the noise generator.
    pub seed: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: SystemModel::LowPass,
            corner_angular_frequency: 1000.0,
            gain: 1.0,
            noise_amplitude: 0.0,
            seed: 1,
        }
    }
}

impl SimulationConfig {
    /// Build the configured model
    pub fn system(&self) -> Arc<dyn LinearSystem> {
        match self.model {
            SystemModel::LowPass => {
                Arc::new(FirstOrderLowPass::new(self.corner_angular_frequency).with_gain(self.gain))
            }
            SystemModel::Gain => Arc::new(Gain(self.gain)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_system_follows_model() {
        let mut config = SimulationConfig::default();
        let low_pass = config.system();
        assert_relative_eq!(low_pass.response(1000.0).norm(), std::f64::consts::FRAC_1_SQRT_2, max_relative = 1e-12);

        config.model = SystemModel::Gain;
        config.gain = 0.3;
        assert_eq!(config.system().response(1000.0).re, 0.3);
    }
}
