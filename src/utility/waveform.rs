// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Waveform Synthesis
//!
//! Pure generation of the periodic excitation signals used to drive a
//! device under test. Five shapes are supported:
//!
//! | Kind        | Shape over one period                  |
//! |-------------|----------------------------------------|
//! | `sine`      | `sin(θ)`                               |
//! | `square`    | +1 on the first half, -1 on the second |
//! | `sawtooth`  | rising ramp from -1 to +1              |
//! | `isawtooth` | falling ramp from +1 to -1             |
//! | `triangle`  | -1 up to +1 at half period, then down  |
//!
//! Waveforms are evaluated on [`time_array`], which starts one sample
//! interval after zero and stops strictly before the requested duration.
//!
//! ## Examples
//!
//! ```rust
//! use span_analyzer::utility::waveform::{generate_waveform, WaveformDescriptor, WaveformKind};
//!
//! let descriptor = WaveformDescriptor {
//!     kind: WaveformKind::Square,
//!     sample_rate: 1000,
//!     frequency: 10.0,
//!     amplitude: 0.5,
//!     phase: 90.0,
//!     duration: 1.0,
//! };
//!
//! let (time, wave) = generate_waveform(&descriptor).unwrap();
//! assert_eq!(time.len(), 999);
//! assert!(wave.iter().all(|v| v.abs() == 0.5));
//! ```

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveformError {
    #[error("Unsupported waveform kind '{0}' (expected sine, square, sawtooth, isawtooth or triangle)")]
    UnsupportedKind(String),

    #[error("Invalid sample rate: {0} (must be a positive integer)")]
    InvalidSampleRate(u32),

    #[error("Invalid duration: {0} s")]
    InvalidDuration(f64),
}

/// Shape of a periodic waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformKind {
    #[default]
    Sine,
    Square,
    Sawtooth,
    /// Inverted sawtooth
    #[serde(rename = "isawtooth")]
    InverseSawtooth,
    Triangle,
}

impl WaveformKind {
    pub const ALL: [WaveformKind; 5] = [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Sawtooth,
        WaveformKind::InverseSawtooth,
        WaveformKind::Triangle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Sawtooth => "sawtooth",
            WaveformKind::InverseSawtooth => "isawtooth",
            WaveformKind::Triangle => "triangle",
        }
    }

    /// Value of the unit waveform at phase `theta` radians
    pub fn evaluate(&self, theta: f64) -> f64 {
        match self {
            WaveformKind::Sine => theta.sin(),
            WaveformKind::Square => {
                if theta.rem_euclid(TAU) < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveformKind::Sawtooth => ramp(theta, 1.0),
            WaveformKind::InverseSawtooth => ramp(theta, 0.0),
            WaveformKind::Triangle => ramp(theta, 0.5),
        }
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaveformKind {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveformKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WaveformError::UnsupportedKind(s.to_string()))
    }
}

/// Ramp rising from -1 to +1 over the first `width` of the period and
/// falling back over the rest
fn ramp(theta: f64, width: f64) -> f64 {
    let t = theta.rem_euclid(TAU);
    let rise = TAU * width;
    if t < rise {
        t / (PI * width) - 1.0
    } else {
        (1.0 + width) / (1.0 - width) - t / (PI * (1.0 - width))
    }
}

/// Parameters of a synthesized waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformDescriptor {
    pub kind: WaveformKind,
    /// Sampling rate in Hz
    pub sample_rate: u32,
    /// Frequency in Hz
    pub frequency: f64,
    /// Peak amplitude in volts
    pub amplitude: f64,
    /// Phase in degrees
    pub phase: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl Default for WaveformDescriptor {
    fn default() -> Self {
        Self {
            kind: WaveformKind::Sine,
            sample_rate: 200_000,
            frequency: 1.0,
            amplitude: 1.0,
            phase: 0.0,
            duration: 1.0,
        }
    }
}

/// Synthesize a waveform, returning its time axis and values
pub fn generate_waveform(
    descriptor: &WaveformDescriptor,
) -> Result<(Vec<f64>, Vec<f64>), WaveformError> {
    let time = time_array(descriptor.duration, descriptor.sample_rate)?;
    let phase = descriptor.phase.to_radians();

    let values = time
        .iter()
        .map(|t| descriptor.amplitude * descriptor.kind.evaluate(TAU * descriptor.frequency * t + phase))
        .collect();

    Ok((time, values))
}

/// Sample instants `k / sample_rate` for k = 1, 2, ... strictly below `duration`
pub fn time_array(duration: f64, sample_rate: u32) -> Result<Vec<f64>, WaveformError> {
    if sample_rate == 0 {
        return Err(WaveformError::InvalidSampleRate(sample_rate));
    }
    if !duration.is_finite() || duration < 0.0 {
        return Err(WaveformError::InvalidDuration(duration));
    }

    let rate = sample_rate as f64;
    Ok((1u64..)
        .map(|k| k as f64 / rate)
        .take_while(|&t| t < duration)
        .collect())
}

/// Number of whole samples in `duration` seconds
///
/// Negative or non-finite durations give 0.
pub fn duration_to_samples(sample_rate: u32, duration: f64) -> usize {
    let samples = duration * sample_rate as f64;
    if samples.is_finite() && samples > 0.0 {
        samples.floor() as usize
    } else {
        0
    }
}

/// Time span of `samples` samples in seconds
pub fn samples_to_duration(sample_rate: u32, samples: usize) -> f64 {
    samples as f64 / sample_rate as f64
}
