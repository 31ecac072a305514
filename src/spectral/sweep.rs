// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Frequency sweeps and the Bode responses they produce
//!
//! [`run_bode_sweep`] drives an [`AcquisitionSession`]: for every frequency
//! of a [`FrequencySweep`] it emits one excitation buffer, captures the
//! device response, and analyzes the pair with a fresh [`BodeAnalyzer`].
//! [`simulate_bode_sweep`] does the same against a [`LinearSystem`] model
//! without any acquisition hardware.

use std::f64::consts::TAU;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::bode::{BodeAnalyzer, BodeSample};
use super::AnalysisError;
use crate::acquisition::AcquisitionSession;
use crate::utility::lti::LinearSystem;
use crate::utility::waveform::{generate_waveform, WaveformDescriptor, WaveformKind};

/// Ordered list of target frequencies in Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySweep {
    frequencies: Vec<f64>,
}

impl FrequencySweep {
    /// Sweep over explicit frequencies, kept in the given order
    pub fn new(frequencies: Vec<f64>) -> Self {
        Self { frequencies }
    }

    /// `points` frequencies evenly spaced in decades, `10^start ..= 10^stop`
    pub fn logspace(start_exponent: f64, stop_exponent: f64, points: usize) -> Self {
        let exponents = linspace(start_exponent, stop_exponent, points);
        Self {
            frequencies: exponents.into_iter().map(|e| 10f64.powf(e)).collect(),
        }
    }

    /// `points` frequencies evenly spaced from `start` to `stop` inclusive
    pub fn linspace(start: f64, stop: f64, points: usize) -> Self {
        Self {
            frequencies: linspace(start, stop, points),
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Evenly spaced values with both end points included
///
/// The last value is exactly `stop`.
pub(crate) fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Parameters of a measured Bode sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Excitation waveform
    pub waveform: WaveformKind,
    /// Excitation amplitude in volts
    pub amplitude: f64,
    /// Duration of every excitation buffer in seconds
    pub duration: f64,
    /// Half-width of the power integration band in Hz
    pub bandwidth: f64,
    /// Phase offset subtracted from every phase, in radians
    pub phase_offset: f64,
    /// Analog output channel driving the device under test
    pub write_channel: String,
    /// Analog input channel capturing the response
    pub read_channel: String,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            waveform: WaveformKind::Sine,
            amplitude: 1.0,
            duration: 1.0,
            bandwidth: 1.0,
            phase_offset: 0.0,
            write_channel: "AO0".to_string(),
            read_channel: "AI0".to_string(),
        }
    }
}

/// Frequency response collected over a sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodeResponse {
    samples: Vec<BodeSample>,
}

impl BodeResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: BodeSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[BodeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.frequency).collect()
    }

    /// Angular frequencies `2π f` in rad/s
    pub fn angular_frequencies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| TAU * s.frequency).collect()
    }

    pub fn powers(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.power).collect()
    }

    /// Amplitude ratios, the square root of the power ratios
    pub fn magnitudes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.power.sqrt()).collect()
    }

    /// Amplitude ratios in decibels, `20·log10(magnitude)`
    pub fn magnitudes_db(&self) -> Vec<f64> {
        self.magnitudes()
            .into_iter()
            .map(|m| 20.0 * m.abs().log10())
            .collect()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.phase).collect()
    }
}

impl FromIterator<BodeSample> for BodeResponse {
    fn from_iter<I: IntoIterator<Item = BodeSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Measure the frequency response of the device wired to `session`
///
/// Every point emits the excitation on `settings.write_channel`, reads the
/// same number of samples back from `settings.read_channel`, and compares
/// the capture with the excitation.
pub fn run_bode_sweep<S>(
    session: &mut S,
    settings: &SweepSettings,
    sweep: &FrequencySweep,
) -> Result<BodeResponse>
where
    S: AcquisitionSession + ?Sized,
{
    let sample_rate = session.sample_rate();
    let write_channels = [settings.write_channel.as_str()];
    let read_channels = [settings.read_channel.as_str()];
    let mut response = BodeResponse::new();

    info!(
        "Starting {} sweep over {} points at {} Hz",
        settings.waveform,
        sweep.len(),
        sample_rate
    );

    for frequency in sweep.iter() {
        let descriptor = WaveformDescriptor {
            kind: settings.waveform,
            sample_rate,
            frequency,
            amplitude: settings.amplitude,
            phase: 0.0,
            duration: settings.duration,
        };
        let (_, excitation) = generate_waveform(&descriptor)
            .with_context(|| format!("Failed to synthesize excitation at {} Hz", frequency))?;
        if excitation.is_empty() {
            bail!(
                "Excitation at {} Hz is empty: duration {} s is shorter than one sample",
                frequency,
                settings.duration
            );
        }

        let buffer = ArrayView2::from_shape((1, excitation.len()), &excitation)
            .context("Failed to shape excitation buffer")?;
        let captured = session
            .readwrite(buffer, &read_channels, &write_channels)
            .with_context(|| format!("Acquisition failed at {} Hz", frequency))?;
        if captured.nrows() == 0 {
            bail!("Acquisition at {} Hz returned no channel data", frequency);
        }
        let output = captured.row(0).to_vec();
        debug!("Captured {} samples at {} Hz", output.len(), frequency);

        let analyzer = BodeAnalyzer::from_slices(sample_rate, &output, Some(&excitation))
            .with_context(|| format!("Captured data at {} Hz cannot be analyzed", frequency))?;
        let sample = analyzer
            .sample(frequency, settings.bandwidth, settings.phase_offset)
            .with_context(|| format!("Analysis failed at {} Hz", frequency))?;

        info!(
            "f = {:.3} Hz: power ratio {:.6e}, phase {:.4} rad",
            sample.frequency, sample.power, sample.phase
        );
        response.push(sample);
    }

    Ok(response)
}

/// Compute the frequency response of a model without acquisition
///
/// The input is `sin(2πft)` over `samples` points spread evenly from 0 to
/// `samples / sample_rate` seconds.
pub fn simulate_bode_sweep(
    system: &dyn LinearSystem,
    sample_rate: u32,
    samples: usize,
    bandwidth: f64,
    sweep: &FrequencySweep,
) -> Result<BodeResponse, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }
    let time = linspace(0.0, samples as f64 / sample_rate as f64, samples);

    sweep
        .iter()
        .map(|frequency| {
            let input: Vec<f64> = time.iter().map(|t| (TAU * frequency * t).sin()).collect();
            let output = system.simulate(&input, sample_rate);

            let analyzer = BodeAnalyzer::from_slices(sample_rate, &output, Some(&input))?;
            let sample = analyzer.sample(frequency, bandwidth, 0.0)?;
            debug!(
                "Simulated f = {:.3} Hz: power ratio {:.6e}, phase {:.4} rad",
                sample.frequency, sample.power, sample.phase
            );
            Ok(sample)
        })
        .collect()
}
