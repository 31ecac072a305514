// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use thiserror::Error;

/// Errors raised by signal construction and Bode analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid sample rate: {0} (must be a positive integer)")]
    InvalidSampleRate(u32),

    #[error("Invalid signal length: {0} samples")]
    InvalidSignalLength(usize),

    #[error("Signal length mismatch: output has {output} samples, input has {input}")]
    LengthMismatch { output: usize, input: usize },

    #[error("Sample rate mismatch: analyzer runs at {expected} Hz, signal was sampled at {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Signal contains a non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    #[error("Invalid target frequency: {0} Hz")]
    InvalidFrequency(f64),

    #[error("Invalid bandwidth half-width: {0} Hz")]
    InvalidBandwidth(f64),

    #[error("Invalid phase offset: {0} rad")]
    InvalidPhaseOffset(f64),

    #[error(
        "Bandwidth too narrow: no frequency bin inside {frequency} ± {half_width} Hz (bin spacing {resolution} Hz)"
    )]
    BandwidthTooNarrow {
        frequency: f64,
        half_width: f64,
        resolution: f64,
    },

    #[error("Degenerate reference power around {frequency} Hz")]
    DegenerateReferencePower { frequency: f64 },

    #[error("Signal of {0} samples has no positive frequency bin")]
    NoPositiveFrequency(usize),
}
