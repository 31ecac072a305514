// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Frequency sweep configuration
//!
//! This module defines the excitation and analysis parameters of a Bode
//! sweep.

use serde::{Deserialize, Serialize};

use crate::spectral::{FrequencySweep, SweepSettings};
use crate::utility::waveform::WaveformKind;

/// Configuration of a logarithmic Bode sweep.
///
/// Frequencies run from `10^start_exponent` to `10^stop_exponent` Hz over
/// `points` log-spaced steps.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SweepConfig {
    /// Excitation waveform shape.
    pub waveform: WaveformKind,

    /// Excitation amplitude in volts.
    pub amplitude: f64,

    /// Length of every excitation buffer in seconds.
    ///
    /// The frequency resolution of the analysis is about `1 / duration`.
    pub duration: f64,

    /// Decade exponent of the first frequency.
    pub start_exponent: f64,

    /// Decade exponent of the last frequency.
    pub stop_exponent: f64,

    /// Number of frequencies in the sweep.
    pub points: usize,

    /// Half-width in Hz of the band integrated around every frequency.
    pub bandwidth: f64,

    /// Phase offset in radians subtracted from every measured phase.
    pub phase_offset: f64,

    /// Analog output driving the device under test.
    pub write_channel: String,

    /// Analog input capturing the response.
    pub read_channel: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            waveform: WaveformKind::Sine,
            amplitude: 1.0,
            duration: 1.0,
            start_exponent: 0.0,
            stop_exponent: 4.0,
            points: 25,
            bandwidth: 1.0,
            phase_offset: 0.0,
            write_channel: "AO0".to_string(),
            read_channel: "AI0".to_string(),
        }
    }
}

impl SweepConfig {
    /// Frequencies visited by the sweep
    pub fn frequencies(&self) -> FrequencySweep {
        FrequencySweep::logspace(self.start_exponent, self.stop_exponent, self.points)
    }

    /// Per-point settings handed to the sweep driver
    pub fn settings(&self) -> SweepSettings {
        SweepSettings {
            waveform: self.waveform,
            amplitude: self.amplitude,
            duration: self.duration,
            bandwidth: self.bandwidth,
            phase_offset: self.phase_offset,
            write_channel: self.write_channel.clone(),
            read_channel: self.read_channel.clone(),
        }
    }
}
