// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bode analysis of a measured response against an optional reference
//!
//! A `BodeAnalyzer` borrows one output signal and, optionally, the input
//! signal that produced it. It answers two questions about a target
//! frequency:
//!
//! - **power**: the spectral power in a band around the target, as a ratio
//!   output/input when an input is given, absolute otherwise
//! - **phase**: the phase of the output at the positive bin closest to the
//!   target, relative to the input (or to a zero-phase sine when no input is
//!   given), wrapped into `(-π, π]`
//!
//! # Power
//!
//! The squared magnitude of the unnormalized DFT is integrated with the
//! trapezoidal rule over the bins strictly inside
//! `(target - half_width, target + half_width)`. A sine of amplitude `A` on an
//! exact bin has `|X_k| = A·N/2`, so an isolated peak integrates to
//! `A²·N²/4·Δf`. When the band holds a single bin, that bin contributes
//! `|X_k|²·Δf`, the value the trapezoid reaches for the same peak surrounded by
//! empty neighbours. An empty band is an error.
//!
//! # Phase
//!
//! Without a reference, the output phase is compared with the phase a unit
//! sine of zero phase produces at the same bin when sampled on the analyzer's
//! time axis (`t_n = (n + 1) / sample_rate`). A waveform generated with a
//! phase of φ degrees therefore reads back as φ in radians.
//!
//! # Example
//!
//! ```
//! use span_analyzer::spectral::BodeAnalyzer;
//! use std::f64::consts::PI;
//!
//! let sample_rate = 1000;
//! let input: Vec<f64> = (1..=1000)
//!     .map(|n| (2.0 * PI * 50.0 * n as f64 / 1000.0).sin())
//!     .collect();
//! let output: Vec<f64> = input.iter().map(|x| 0.5 * x).collect();
//!
//! let analyzer = BodeAnalyzer::from_slices(sample_rate, &output, Some(&input)).unwrap();
//! let ratio = analyzer.power(50.0, 1.0).unwrap();
//! assert!((ratio - 0.25).abs() < 1e-9);
//! ```

use std::f64::consts::{PI, TAU};

use log::debug;
use serde::{Deserialize, Serialize};

use super::fft::{trapezoid, SpectrumData};
use super::signal::{time_axis, SampledSignal};
use super::AnalysisError;

/// One point of a frequency response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodeSample {
    /// Target frequency in Hz
    pub frequency: f64,
    /// Power ratio (or absolute power without a reference)
    pub power: f64,
    /// Phase difference in radians, in `(-π, π]`
    pub phase: f64,
}

/// Frequency-domain comparison of an output signal with an optional input
#[derive(Debug, Clone)]
pub struct BodeAnalyzer<'a> {
    sample_rate: u32,
    output: &'a [f64],
    input: Option<&'a [f64]>,
    time: Vec<f64>,
}

impl<'a> BodeAnalyzer<'a> {
    /// Build an analyzer over two sampled signals
    ///
    /// Both signals must be sampled at `sample_rate` and, when an input is
    /// given, have the same length.
    pub fn new(
        sample_rate: u32,
        output: &'a SampledSignal,
        input: Option<&'a SampledSignal>,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        for signal in std::iter::once(output).chain(input) {
            if signal.sample_rate() != sample_rate {
                return Err(AnalysisError::SampleRateMismatch {
                    expected: sample_rate,
                    actual: signal.sample_rate(),
                });
            }
        }
        Self::from_slices(sample_rate, output.values(), input.map(SampledSignal::values))
    }

    /// Build an analyzer over raw sample slices
    ///
    /// # Errors
    ///
    /// * `InvalidSampleRate` when `sample_rate` is zero
    /// * `InvalidSignalLength` when either signal is empty
    /// * `LengthMismatch` when input and output lengths differ
    /// * `NonFiniteSample` when a sample is NaN or infinite
    pub fn from_slices(
        sample_rate: u32,
        output: &'a [f64],
        input: Option<&'a [f64]>,
    ) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if output.is_empty() {
            return Err(AnalysisError::InvalidSignalLength(0));
        }
        check_finite(output)?;

        if let Some(input) = input {
            if input.is_empty() {
                return Err(AnalysisError::InvalidSignalLength(0));
            }
            if input.len() != output.len() {
                return Err(AnalysisError::LengthMismatch {
                    output: output.len(),
                    input: input.len(),
                });
            }
            check_finite(input)?;
        }

        Ok(Self {
            sample_rate,
            output,
            input,
            time: time_axis(sample_rate, output.len()),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples per signal
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn has_reference(&self) -> bool {
        self.input.is_some()
    }

    /// Sample instants of the analyzed signals
    pub fn time_axis(&self) -> &[f64] {
        &self.time
    }

    /// Power in the band `frequency ± half_width`
    ///
    /// Returns `power_out / power_in` with a reference, `power_out` without.
    ///
    /// # Errors
    ///
    /// * `InvalidFrequency` / `InvalidBandwidth` for non-finite arguments or a
    ///   non-positive half-width
    /// * `BandwidthTooNarrow` when no bin lies inside the band
    /// * `DegenerateReferencePower` when the reference carries no power in the
    ///   band
    pub fn power(&self, frequency: f64, half_width: f64) -> Result<f64, AnalysisError> {
        check_frequency(frequency)?;
        if !half_width.is_finite() || half_width <= 0.0 {
            return Err(AnalysisError::InvalidBandwidth(half_width));
        }

        let spectrum_out = SpectrumData::compute(self.output, self.sample_rate);
        let band = spectrum_out.band_indices(frequency - half_width, frequency + half_width);
        if band.is_empty() {
            return Err(AnalysisError::BandwidthTooNarrow {
                frequency,
                half_width,
                resolution: spectrum_out.resolution(),
            });
        }
        debug!(
            "Integrating {} bins around {} Hz (±{} Hz)",
            band.len(),
            frequency,
            half_width
        );

        let power_out = band_power(&spectrum_out, &band);

        let Some(input) = self.input else {
            return Ok(power_out);
        };

        let spectrum_in = SpectrumData::compute(input, self.sample_rate);
        let power_in = band_power(&spectrum_in, &band);
        if power_in <= 0.0 {
            return Err(AnalysisError::DegenerateReferencePower { frequency });
        }

        let ratio = power_out / power_in;
        if !ratio.is_finite() {
            return Err(AnalysisError::DegenerateReferencePower { frequency });
        }
        Ok(ratio)
    }

    /// Phase at the positive bin nearest to `frequency`, in `(-π, π]`
    ///
    /// Without an input the reference is not zero: it is the argument a
    /// zero-phase unit sine on the analyzer's time axis produces at the same
    /// bin, `2π·f_bin/sample_rate - π/2`. The result is therefore the phase
    /// the output was generated with, not the raw DFT argument.
    pub fn phase(&self, frequency: f64) -> Result<f64, AnalysisError> {
        self.phase_with_offset(frequency, 0.0)
    }

    /// Phase at the positive bin nearest to `frequency`, minus `offset`
    ///
    /// `offset` is in radians and may be any finite value.
    ///
    /// # Errors
    ///
    /// * `InvalidFrequency` / `InvalidPhaseOffset` for non-finite arguments
    /// * `NoPositiveFrequency` for single-sample signals
    pub fn phase_with_offset(&self, frequency: f64, offset: f64) -> Result<f64, AnalysisError> {
        check_frequency(frequency)?;
        if !offset.is_finite() {
            return Err(AnalysisError::InvalidPhaseOffset(offset));
        }

        let spectrum_out = SpectrumData::compute(self.output, self.sample_rate);
        let bin = spectrum_out
            .nearest_positive_bin(frequency)
            .ok_or(AnalysisError::NoPositiveFrequency(self.output.len()))?;
        let bin_frequency = spectrum_out.frequencies[bin];

        let phase_out = spectrum_out.phase(bin);
        let phase_in = match self.input {
            Some(input) => SpectrumData::compute(input, self.sample_rate).phase(bin),
            None => self.sine_reference_phase(bin_frequency),
        };
        debug!(
            "Phase at {} Hz (bin {} Hz): output {:.6} rad, reference {:.6} rad",
            frequency, bin_frequency, phase_out, phase_in
        );

        let difference = restrict_to_pi_pi(phase_out - phase_in);
        Ok(restrict_to_pi_pi(difference - wrap_angle(offset)))
    }

    /// Power and phase at `frequency` in one sample
    pub fn sample(
        &self,
        frequency: f64,
        half_width: f64,
        phase_offset: f64,
    ) -> Result<BodeSample, AnalysisError> {
        Ok(BodeSample {
            frequency,
            power: self.power(frequency, half_width)?,
            phase: self.phase_with_offset(frequency, phase_offset)?,
        })
    }

    /// DFT argument of `sin(2π f t)` at the bin `f`, sampled on the time axis
    fn sine_reference_phase(&self, bin_frequency: f64) -> f64 {
        let t0 = self.time.first().copied().unwrap_or(0.0);
        wrap_angle(TAU * bin_frequency * t0 - PI / 2.0)
    }
}

/// Bring a difference of two angles in `(-π, π]` back into `(-π, π]`
///
/// A single correction of 2π is applied: values above π lose 2π, values at
/// or below -π gain 2π. π itself is kept, -π maps to π.
pub fn restrict_to_pi_pi(angle: f64) -> f64 {
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}

/// Reduce any finite angle into `(-π, π]`
pub fn wrap_angle(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(TAU);
    if reduced > PI {
        reduced - TAU
    } else {
        reduced
    }
}

fn band_power(spectrum: &SpectrumData, band: &[usize]) -> f64 {
    if let [single] = band {
        return spectrum.power(*single) * spectrum.resolution();
    }

    let frequencies: Vec<f64> = band.iter().map(|&i| spectrum.frequencies[i]).collect();
    let powers: Vec<f64> = band.iter().map(|&i| spectrum.power(i)).collect();
    trapezoid(&frequencies, &powers)
}

fn check_frequency(frequency: f64) -> Result<(), AnalysisError> {
    if frequency.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidFrequency(frequency))
    }
}

fn check_finite(values: &[f64]) -> Result<(), AnalysisError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(AnalysisError::NonFiniteSample { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::waveform::{generate_waveform, WaveformDescriptor, WaveformKind};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Sine sampled on the analyzer's time axis, `t_n = (n + 1) / rate`
    fn sine(amplitude: f64, freq: f64, sample_rate: u32, num_samples: usize) -> Vec<f64> {
        (1..=num_samples)
            .map(|n| amplitude * (TAU * freq * n as f64 / sample_rate as f64).sin())
            .collect()
    }

    fn generated_sine(frequency: f64, phase_degrees: f64) -> Vec<f64> {
        let descriptor = WaveformDescriptor {
            kind: WaveformKind::Sine,
            sample_rate: 1000,
            frequency,
            amplitude: 1.0,
            phase: phase_degrees,
            // 1000 samples: t = 0.001 ..= 1.0
            duration: 1.0005,
        };
        let (_, values) = generate_waveform(&descriptor).unwrap();
        assert_eq!(values.len(), 1000);
        values
    }

    #[test]
    fn test_power_of_pure_sine_without_reference() {
        let signal = sine(2.0, 50.0, 1000, 1000);
        let analyzer = BodeAnalyzer::from_slices(1000, &signal, None).unwrap();

        // A² · (N/2)² · Δf with A = 2, N = 1000, Δf = 1 Hz
        let power = analyzer.power(50.0, 1.0).unwrap();
        assert_relative_eq!(power, 4.0 * 500.0 * 500.0, max_relative = 1e-9);

        let phase = analyzer.phase(50.0).unwrap();
        assert_abs_diff_eq!(phase, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_power_is_stable_across_isolating_bandwidths() {
        let signal = sine(1.0, 50.0, 1000, 1000);
        let analyzer = BodeAnalyzer::from_slices(1000, &signal, None).unwrap();

        let narrow = analyzer.power(50.0, 0.5).unwrap();
        for half_width in [1.0, 2.0, 3.5, 10.0] {
            let wide = analyzer.power(50.0, half_width).unwrap();
            assert_relative_eq!(wide, narrow, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_power_scales_with_amplitude_squared() {
        let small = sine(1.0, 120.0, 1000, 1000);
        let large = sine(3.0, 120.0, 1000, 1000);

        let p_small = BodeAnalyzer::from_slices(1000, &small, None)
            .unwrap()
            .power(120.0, 2.0)
            .unwrap();
        let p_large = BodeAnalyzer::from_slices(1000, &large, None)
            .unwrap()
            .power(120.0, 2.0)
            .unwrap();

        assert_relative_eq!(p_large / p_small, 9.0, max_relative = 1e-9);
    }

    #[test]
    fn test_phase_of_generated_sine_reads_back_its_phase() {
        let zero = generated_sine(50.0, 0.0);
        let analyzer = BodeAnalyzer::from_slices(1000, &zero, None).unwrap();
        assert_abs_diff_eq!(analyzer.phase(50.0).unwrap(), 0.0, epsilon = 1e-9);

        let quarter = generated_sine(50.0, 45.0);
        let analyzer = BodeAnalyzer::from_slices(1000, &quarter, None).unwrap();
        assert_abs_diff_eq!(analyzer.phase(50.0).unwrap(), PI / 4.0, epsilon = 1e-9);

        // 270° wraps to -90°
        let wrapped = generated_sine(50.0, 270.0);
        let analyzer = BodeAnalyzer::from_slices(1000, &wrapped, None).unwrap();
        assert_abs_diff_eq!(analyzer.phase(50.0).unwrap(), -PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_input_and_output() {
        let descriptor = WaveformDescriptor {
            kind: WaveformKind::Square,
            sample_rate: 2000,
            frequency: 37.3,
            amplitude: 0.8,
            phase: 30.0,
            duration: 0.75,
        };
        let (_, values) = generate_waveform(&descriptor).unwrap();
        let analyzer = BodeAnalyzer::from_slices(2000, &values, Some(&values)).unwrap();

        for frequency in [37.3, 111.9, 400.0] {
            assert_relative_eq!(analyzer.power(frequency, 5.0).unwrap(), 1.0, max_relative = 1e-12);
            assert_abs_diff_eq!(analyzer.phase(frequency).unwrap(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ratio_and_phase_against_reference() {
        let input = sine(1.0, 40.0, 1000, 1000);
        // Half amplitude, lagging by 60°
        let output: Vec<f64> = (1..=1000)
            .map(|n| 0.5 * (TAU * 40.0 * n as f64 / 1000.0 - PI / 3.0).sin())
            .collect();

        let analyzer = BodeAnalyzer::from_slices(1000, &output, Some(&input)).unwrap();
        assert_relative_eq!(analyzer.power(40.0, 3.0).unwrap(), 0.25, max_relative = 1e-9);
        assert_abs_diff_eq!(analyzer.phase(40.0).unwrap(), -PI / 3.0, epsilon = 1e-9);

        let sample = analyzer.sample(40.0, 3.0, 0.0).unwrap();
        assert_eq!(sample.frequency, 40.0);
        assert_relative_eq!(sample.power, 0.25, max_relative = 1e-9);
    }

    #[test]
    fn test_phase_offset_is_subtracted_and_wrapped() {
        let signal = generated_sine(50.0, 170.0);
        let analyzer = BodeAnalyzer::from_slices(1000, &signal, None).unwrap();

        let raw = analyzer.phase(50.0).unwrap();
        assert_abs_diff_eq!(raw, 170f64.to_radians(), epsilon = 1e-9);

        // 170° - (-30°) = 200° -> -160°
        let shifted = analyzer.phase_with_offset(50.0, (-30f64).to_radians()).unwrap();
        assert_abs_diff_eq!(shifted, (-160f64).to_radians(), epsilon = 1e-9);

        // Offsets beyond a full turn reduce first
        let turned = analyzer
            .phase_with_offset(50.0, (-30f64).to_radians() + 4.0 * TAU)
            .unwrap();
        assert_abs_diff_eq!(turned, shifted, epsilon = 1e-9);
    }

    #[test]
    fn test_phase_selection_is_deterministic() {
        let signal = sine(1.0, 12.0, 100, 80);
        let analyzer = BodeAnalyzer::from_slices(100, &signal, None).unwrap();
        let first = analyzer.phase(12.1).unwrap();
        for _ in 0..5 {
            assert_eq!(analyzer.phase(12.1).unwrap(), first);
        }
    }

    #[test]
    fn test_zero_length_signal_is_rejected() {
        assert_eq!(
            BodeAnalyzer::from_slices(1000, &[], None).unwrap_err(),
            AnalysisError::InvalidSignalLength(0)
        );
        let output = [1.0, 2.0];
        assert_eq!(
            BodeAnalyzer::from_slices(1000, &output, Some(&[])).unwrap_err(),
            AnalysisError::InvalidSignalLength(0)
        );
    }

    #[test]
    fn test_shape_and_rate_errors() {
        let output = [0.0; 8];
        let input = [0.0; 6];
        assert_eq!(
            BodeAnalyzer::from_slices(0, &output, None).unwrap_err(),
            AnalysisError::InvalidSampleRate(0)
        );
        assert_eq!(
            BodeAnalyzer::from_slices(100, &output, Some(&input)).unwrap_err(),
            AnalysisError::LengthMismatch {
                output: 8,
                input: 6
            }
        );

        let at_100 = SampledSignal::new(100, vec![0.0; 8]).unwrap();
        let at_200 = SampledSignal::new(200, vec![0.0; 8]).unwrap();
        assert_eq!(
            BodeAnalyzer::new(100, &at_100, Some(&at_200)).unwrap_err(),
            AnalysisError::SampleRateMismatch {
                expected: 100,
                actual: 200
            }
        );

        // A zero analyzer rate is reported before any per-signal comparison
        let at_1000 = SampledSignal::new(1000, vec![1.0; 8]).unwrap();
        assert_eq!(
            BodeAnalyzer::new(0, &at_1000, None).unwrap_err(),
            AnalysisError::InvalidSampleRate(0)
        );
        assert_eq!(
            BodeAnalyzer::new(0, &at_1000, Some(&at_100)).unwrap_err(),
            AnalysisError::InvalidSampleRate(0)
        );

        let with_nan = [0.0, f64::NAN, 1.0];
        assert_eq!(
            BodeAnalyzer::from_slices(100, &with_nan, None).unwrap_err(),
            AnalysisError::NonFiniteSample { index: 1 }
        );
    }

    #[test]
    fn test_bandwidth_too_narrow() {
        let signal = sine(1.0, 50.0, 1000, 1000);
        let analyzer = BodeAnalyzer::from_slices(1000, &signal, None).unwrap();

        match analyzer.power(50.5, 0.1) {
            Err(AnalysisError::BandwidthTooNarrow { resolution, .. }) => {
                assert_eq!(resolution, 1.0)
            }
            other => panic!("expected BandwidthTooNarrow, got {:?}", other),
        }
        assert_eq!(
            analyzer.power(50.0, 0.0).unwrap_err(),
            AnalysisError::InvalidBandwidth(0.0)
        );
    }

    #[test]
    fn test_degenerate_reference_power() {
        let output = sine(1.0, 50.0, 1000, 1000);
        let silent = vec![0.0; 1000];
        let analyzer = BodeAnalyzer::from_slices(1000, &output, Some(&silent)).unwrap();

        assert_eq!(
            analyzer.power(50.0, 2.0).unwrap_err(),
            AnalysisError::DegenerateReferencePower { frequency: 50.0 }
        );
    }

    #[test]
    fn test_single_sample_has_no_phase() {
        let analyzer = BodeAnalyzer::from_slices(1000, &[1.0], None).unwrap();
        assert_eq!(
            analyzer.phase(10.0).unwrap_err(),
            AnalysisError::NoPositiveFrequency(1)
        );
    }

    #[test]
    fn test_restrict_to_pi_pi() {
        assert_eq!(restrict_to_pi_pi(PI), PI);
        assert_eq!(restrict_to_pi_pi(-PI), PI);
        assert_abs_diff_eq!(restrict_to_pi_pi(1.5 * PI), -0.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(restrict_to_pi_pi(-1.5 * PI), 0.5 * PI, epsilon = 1e-12);

        let angles = [-PI + 1e-9, -2.0, -0.3, 0.0, 0.7, 2.9, PI];
        for &a in &angles {
            for &b in &angles {
                let wrapped = restrict_to_pi_pi(a - b);
                assert!(wrapped > -PI && wrapped <= PI, "{} - {} -> {}", a, b, wrapped);
            }
        }
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_abs_diff_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_angle(7.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_angle(-5.0 * TAU + 0.25), 0.25, epsilon = 1e-9);
    }
}
