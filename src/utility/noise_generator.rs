// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Gaussian Noise Generator
//!
//! This module provides a lightweight generator of Gaussian white noise in
//! volts. The simulated DAQ uses it to add measurement noise to the
//! voltages it returns on its analog inputs, which makes it possible to
//! check how a Bode sweep degrades with a realistic noise floor.
//!
//! ## Features
//!
//! * Fast XORShift pseudo-random number generation
//! * Box-Muller transform for Gaussian distribution
//! * Reproducible sequences from a seed
//!
//! ## Examples
//!
//! ```rust
//! use span_analyzer::utility::noise_generator::NoiseGenerator;
//!
//! let mut generator = NoiseGenerator::new(42);
//!
//! // 1000 samples of noise with a standard deviation of 10 mV
//! let noise = generator.generate(1000, 0.01);
//! assert_eq!(noise.len(), 1000);
//! ```

use std::time::SystemTime;

/// State used in place of a zero seed, which XORShift cannot leave
const FALLBACK_STATE: u32 = 0x9E37_79B9;

/// Random number generator using the XORShift algorithm.
///
/// Not suitable for cryptographic purposes. The same seed always produces
/// the same sequence.
///
/// # Examples
///
/// ```
/// use span_analyzer::utility::noise_generator::NoiseGenerator;
///
/// let mut generator = NoiseGenerator::new(12345);
///
/// let uniform = generator.random_float();
/// assert!((-1.0..=1.0).contains(&uniform));
///
/// let gaussian = generator.random_gaussian();
/// assert!(gaussian.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    /// Internal state of the XORShift generator
    rng_state: u32,
}

impl NoiseGenerator {
    /// Creates a new noise generator with a given seed.
    ///
    /// A seed of 0 is replaced by a fixed non-zero state, since an
    /// all-zero XORShift state never changes.
    pub fn new(seed: u32) -> Self {
        let rng_state = if seed == 0 { FALLBACK_STATE } else { seed };
        Self { rng_state }
    }

    /// Creates a new noise generator seeded from the system clock.
    pub fn new_from_system_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as u32)
            .unwrap_or_default();
        Self::new(seed)
    }

    /// Generates a random number uniformly distributed in [-1.0, 1.0].
    pub fn random_float(&mut self) -> f64 {
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;

        (self.rng_state as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    /// Generates a value from a standard Gaussian distribution.
    ///
    /// # Mathematical Background
    ///
    /// The Box-Muller transform maps two uniform variables u1, u2 in (0, 1)
    /// to a standard normal variable:
    /// ```text
    /// z = sqrt(-2 * ln(u1)) * cos(2 * π * u2)
    /// ```
    pub fn random_gaussian(&mut self) -> f64 {
        let u1 = (self.random_float() + 1.0) / 2.0;
        let u2 = (self.random_float() + 1.0) / 2.0;

        // Avoid ln(0)
        let u1 = u1.max(1e-12);

        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Generates `num_samples` of white noise with standard deviation `sigma`.
    pub fn generate(&mut self, num_samples: usize, sigma: f64) -> Vec<f64> {
        (0..num_samples)
            .map(|_| self.random_gaussian() * sigma)
            .collect()
    }

    /// Adds white noise with standard deviation `sigma` to `samples` in place.
    pub fn add_to(&mut self, samples: &mut [f64], sigma: f64) {
        for sample in samples.iter_mut() {
            *sample += self.random_gaussian() * sigma;
        }
    }
}
