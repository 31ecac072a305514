// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Fast Fourier Transform (FFT) helpers for spectral analysis
//!
//! This module turns a real, uniformly sampled signal into a complex spectrum
//! laid out along a zero-centred frequency axis:
//!
//! - `compute_fft` runs an unnormalized forward transform with rustfft
//!   (`X_k = Σ x_n e^{-2πikn/N}`)
//! - `fft_shift` moves the negative frequencies in front of the positive ones
//! - `shifted_frequencies` builds the matching axis with a spacing of
//!   `sample_rate / N`
//! - `trapezoid` integrates sampled data with the trapezoidal rule
//!
//! `SpectrumData` bundles the three so that the Bode analyzer can select
//! frequency bands and nearest bins without re-deriving index arithmetic.
//!
//! # Example
//!
//! ```
//! use span_analyzer::spectral::fft::SpectrumData;
//!
//! let sample_rate = 1000;
//! let signal: Vec<f64> = (0..1000)
//!     .map(|n| (2.0 * std::f64::consts::PI * 50.0 * n as f64 / 1000.0).sin())
//!     .collect();
//!
//! let spectrum = SpectrumData::compute(&signal, sample_rate);
//! let bin = spectrum.nearest_positive_bin(50.0).unwrap();
//! assert_eq!(spectrum.frequencies[bin], 50.0);
//! ```

use rustfft::{num_complex::Complex64, FftPlanner};

/// Spectrum of a real signal on a zero-centred frequency axis
///
/// `frequencies` and `bins` have the same length as the analyzed signal.
/// Index `i` holds the component at `frequencies[i]`, ascending from
/// `-floor(N/2)·Δf` to `(ceil(N/2) - 1)·Δf`.
#[derive(Debug, Clone)]
pub struct SpectrumData {
    /// Frequency of every bin in Hz, ascending
    pub frequencies: Vec<f64>,

    /// Complex transform value of every bin (unnormalized)
    pub bins: Vec<Complex64>,

    /// Sample rate of the analyzed signal in Hz
    pub sample_rate: u32,
}

impl SpectrumData {
    /// Transform `signal` and lay the result out on the shifted axis
    pub fn compute(signal: &[f64], sample_rate: u32) -> Self {
        let bins = fft_shift(&compute_fft(signal));
        let frequencies = shifted_frequencies(signal.len(), sample_rate);

        Self {
            frequencies,
            bins,
            sample_rate,
        }
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin spacing in Hz
    pub fn resolution(&self) -> f64 {
        if self.bins.is_empty() {
            return 0.0;
        }
        self.sample_rate as f64 / self.bins.len() as f64
    }

    /// Squared magnitude of bin `index`
    pub fn power(&self, index: usize) -> f64 {
        self.bins[index].norm_sqr()
    }

    /// Argument of bin `index` in radians, in `[-π, π]`
    pub fn phase(&self, index: usize) -> f64 {
        self.bins[index].arg()
    }

    /// Indices of the bins strictly inside the open interval `(low, high)`
    pub fn band_indices(&self, low: f64, high: f64) -> Vec<usize> {
        self.frequencies
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > low && f < high)
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the strictly positive bin closest to `target`
    ///
    /// Ties go to the lowest frequency. Returns `None` when the spectrum has
    /// no positive bin (signals shorter than two samples).
    pub fn nearest_positive_bin(&self, target: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, &f) in self.frequencies.iter().enumerate() {
            if f <= 0.0 {
                continue;
            }
            let distance = (f - target).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((i, distance)),
            }
        }

        best.map(|(i, _)| i)
    }
}

/// Compute the forward FFT of a real signal
///
/// The result is in the usual FFT order: DC at index 0, positive
/// frequencies next, then the negative frequencies.
pub fn compute_fft(signal: &[f64]) -> Vec<Complex64> {
    if signal.is_empty() {
        return Vec::new();
    }

    // Convert input to complex numbers
    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);

    buffer
}

/// Rotate FFT-ordered data so that the zero frequency sits in the middle
///
/// Equivalent to rolling the data right by `floor(N/2)`.
pub fn fft_shift<T: Copy>(values: &[T]) -> Vec<T> {
    let n = values.len();
    let split = n - n / 2;

    let mut shifted = Vec::with_capacity(n);
    shifted.extend_from_slice(&values[split..]);
    shifted.extend_from_slice(&values[..split]);
    shifted
}

/// Frequencies of the shifted spectrum of an `len`-sample signal
pub fn shifted_frequencies(len: usize, sample_rate: u32) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    let half = (len / 2) as f64;
    let rate = sample_rate as f64;
    let n = len as f64;

    (0..len).map(|i| (i as f64 - half) * rate / n).collect()
}

/// Integrate `y` over `x` with the trapezoidal rule
///
/// Returns 0.0 for fewer than two points.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn create_sine(amplitude: f64, freq: f64, sample_rate: u32, num_samples: usize) -> Vec<f64> {
        (0..num_samples)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / sample_rate as f64).sin())
            .collect()
    }

    #[test]
    fn test_shift_even_length() {
        assert_eq!(fft_shift(&[0, 1, 2, 3]), vec![2, 3, 0, 1]);
        assert_eq!(shifted_frequencies(4, 4), vec![-2.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shift_odd_length() {
        assert_eq!(fft_shift(&[0, 1, 2, 3, 4]), vec![3, 4, 0, 1, 2]);
        assert_eq!(shifted_frequencies(5, 5), vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_shift_single_sample() {
        assert_eq!(fft_shift(&[7]), vec![7]);
        assert_eq!(shifted_frequencies(1, 100), vec![0.0]);
    }

    #[test]
    fn test_trapezoid() {
        assert_eq!(trapezoid(&[], &[]), 0.0);
        assert_eq!(trapezoid(&[1.0], &[5.0]), 0.0);
        assert_relative_eq!(trapezoid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]), 1.0);
        assert_relative_eq!(trapezoid(&[0.0, 0.5, 2.0], &[2.0, 2.0, 2.0]), 4.0);
    }

    #[test]
    fn test_sine_peak_magnitude() {
        let sample_rate = 1024;
        let spectrum = SpectrumData::compute(&create_sine(1.5, 10.0, sample_rate, 1024), sample_rate);

        let bin = spectrum.nearest_positive_bin(10.0).unwrap();
        assert_eq!(spectrum.frequencies[bin], 10.0);
        // |X_k| = A * N / 2 for an on-bin sine
        assert_relative_eq!(spectrum.bins[bin].norm(), 1.5 * 512.0, max_relative = 1e-9);
        // Mirror image at -10 Hz carries the same magnitude
        let mirror = spectrum.frequencies.iter().position(|&f| f == -10.0).unwrap();
        assert_relative_eq!(spectrum.bins[mirror].norm(), 1.5 * 512.0, max_relative = 1e-9);
    }

    #[test]
    fn test_band_indices_are_open_interval() {
        let spectrum = SpectrumData::compute(&vec![0.0; 10], 10);
        let band = spectrum.band_indices(1.0, 3.0);
        let freqs: Vec<f64> = band.iter().map(|&i| spectrum.frequencies[i]).collect();
        assert_eq!(freqs, vec![2.0]);
    }

    #[test]
    fn test_nearest_bin_tie_takes_lowest_frequency() {
        let spectrum = SpectrumData::compute(&vec![0.0; 8], 8);
        let bin = spectrum.nearest_positive_bin(1.5).unwrap();
        assert_eq!(spectrum.frequencies[bin], 1.0);
        // Same answer on every call
        assert_eq!(spectrum.nearest_positive_bin(1.5), Some(bin));
    }

    #[test]
    fn test_nearest_bin_ignores_zero_and_negative() {
        let spectrum = SpectrumData::compute(&vec![0.0; 8], 8);
        let bin = spectrum.nearest_positive_bin(-3.0).unwrap();
        assert_eq!(spectrum.frequencies[bin], 1.0);

        let single = SpectrumData::compute(&[1.0], 8);
        assert_eq!(single.nearest_positive_bin(1.0), None);
    }
}
