// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Uniformly sampled real signals

use super::AnalysisError;

/// A finite, uniformly sampled voltage signal
///
/// The sample rate is fixed at construction. The signal holds at least one
/// sample, so `duration()` is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSignal {
    sample_rate: u32,
    values: Vec<f64>,
}

impl SampledSignal {
    /// Wrap `values` sampled at `sample_rate` Hz
    ///
    /// # Errors
    ///
    /// * `AnalysisError::InvalidSampleRate` if `sample_rate` is zero
    /// * `AnalysisError::InvalidSignalLength` if `values` is empty
    pub fn new(sample_rate: u32, values: Vec<f64>) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if values.is_empty() {
            return Err(AnalysisError::InvalidSignalLength(0));
        }
        Ok(Self {
            sample_rate,
            values,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time span covered by the samples, `N / sample_rate` seconds
    pub fn duration(&self) -> f64 {
        self.values.len() as f64 / self.sample_rate as f64
    }

    /// Sample instants `(n + 1) / sample_rate` for n = 0..N
    pub fn time_axis(&self) -> Vec<f64> {
        time_axis(self.sample_rate, self.values.len())
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Local time axis for `len` samples, starting one sample interval past zero
pub(crate) fn time_axis(sample_rate: u32, len: usize) -> Vec<f64> {
    let rate = sample_rate as f64;
    (1..=len).map(|n| n as f64 / rate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_rate_and_empty_values() {
        assert_eq!(
            SampledSignal::new(0, vec![1.0]),
            Err(AnalysisError::InvalidSampleRate(0))
        );
        assert_eq!(
            SampledSignal::new(1000, Vec::new()),
            Err(AnalysisError::InvalidSignalLength(0))
        );
    }

    #[test]
    fn test_duration_and_time_axis() {
        let signal = SampledSignal::new(4, vec![0.0; 8]).unwrap();
        assert_eq!(signal.duration(), 2.0);
        assert_eq!(
            signal.time_axis(),
            vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0]
        );
    }
}
