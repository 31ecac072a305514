// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Linear time-invariant system models
//!
//! These models stand in for a device under test. They are used by the
//! simulated DAQ backend to produce a response on its analog inputs, by the
//! offline sweep, and to draw the analytic curve next to measured data.

use std::fmt::Debug;

use rustfft::num_complex::Complex64;

/// A continuous-time LTI system
pub trait LinearSystem: Debug + Send + Sync {
    /// Response to `input` sampled at `sample_rate`, starting from rest
    fn simulate(&self, input: &[f64], sample_rate: u32) -> Vec<f64>;

    /// Transfer function evaluated at `jω`
    fn response(&self, angular_frequency: f64) -> Complex64;
}

/// Static gain `k`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain(pub f64);

impl LinearSystem for Gain {
    fn simulate(&self, input: &[f64], _sample_rate: u32) -> Vec<f64> {
        input.iter().map(|u| self.0 * u).collect()
    }

    fn response(&self, _angular_frequency: f64) -> Complex64 {
        Complex64::new(self.0, 0.0)
    }
}

/// First-order low-pass `k·ωc / (ωc + jω)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderLowPass {
    /// Corner angular frequency in rad/s
    pub corner: f64,
    /// DC gain
    pub gain: f64,
}

impl FirstOrderLowPass {
    /// Unit-gain low-pass with corner at `corner` rad/s
    pub fn new(corner: f64) -> Self {
        Self { corner, gain: 1.0 }
    }

    /// Unit-gain low-pass with corner at `frequency` Hz
    pub fn from_corner_frequency(frequency: f64) -> Self {
        Self::new(std::f64::consts::TAU * frequency)
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }
}

impl LinearSystem for FirstOrderLowPass {
    /// Exact discretization for an input that is linear between samples
    /// (first-order hold)
    fn simulate(&self, input: &[f64], sample_rate: u32) -> Vec<f64> {
        let mut output = Vec::with_capacity(input.len());
        if input.is_empty() || sample_rate == 0 {
            return output;
        }

        let h = self.corner / sample_rate as f64;
        let a = (-h).exp();
        // (1 - a) / h, accurate for small h
        let q = if h > 0.0 { -(-h).exp_m1() / h } else { 1.0 };
        let b_prev = q - a;
        let b_next = 1.0 - q;

        let mut y = 0.0;
        output.push(y);
        for u in input.windows(2) {
            y = a * y + self.gain * (b_prev * u[0] + b_next * u[1]);
            output.push(y);
        }
        output
    }

    fn response(&self, angular_frequency: f64) -> Complex64 {
        Complex64::new(self.gain * self.corner, 0.0)
            / Complex64::new(self.corner, angular_frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::{FRAC_PI_4, TAU};

    #[test]
    fn test_gain() {
        let gain = Gain(-2.0);
        assert_eq!(gain.simulate(&[1.0, 0.5], 10), vec![-2.0, -1.0]);
        assert_eq!(gain.response(123.0), Complex64::new(-2.0, 0.0));
    }

    #[test]
    fn test_low_pass_response_at_corner() {
        let filter = FirstOrderLowPass::from_corner_frequency(50.0);
        let h = filter.response(TAU * 50.0);
        assert_relative_eq!(h.norm(), std::f64::consts::FRAC_1_SQRT_2, max_relative = 1e-12);
        assert_relative_eq!(h.arg(), -FRAC_PI_4, max_relative = 1e-12);
        assert_relative_eq!(filter.response(0.0).re, 1.0);
    }

    #[test]
    fn test_low_pass_step_response() {
        let corner = 100.0;
        let sample_rate = 10_000;
        let filter = FirstOrderLowPass::new(corner).with_gain(3.0);

        let mut step = vec![1.0; 2000];
        step[0] = 0.0;
        let output = filter.simulate(&step, sample_rate);
        assert_eq!(output.len(), step.len());
        assert_eq!(output[0], 0.0);

        // Settled after 20 time constants
        assert_abs_diff_eq!(output[1999], 3.0, epsilon = 1e-6);
        // One time constant after the ramp ends
        let h = corner / sample_rate as f64;
        let expected = 3.0 * (1.0 - (-1.0f64).exp() * (1.0 - (-h).exp()) / h);
        assert_relative_eq!(output[101], expected, max_relative = 1e-9);
    }

    #[test]
    fn test_low_pass_empty_input() {
        let filter = FirstOrderLowPass::new(10.0);
        assert!(filter.simulate(&[], 1000).is_empty());
    }
}
