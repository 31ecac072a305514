// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Spectral analysis module
//!
//! This module handles the frequency-domain side of the analyzer:
//! transforming sampled signals ([`fft`]), extracting power and phase at a
//! target frequency ([`bode`]), sweeping a device across frequencies
//! ([`sweep`]) and preparing the numeric data a Bode plot needs ([`plot`]).

mod error;
mod signal;

pub mod bode;
pub mod fft;
pub mod plot;
pub mod sweep;

pub use bode::{restrict_to_pi_pi, wrap_angle, BodeAnalyzer, BodeSample};
pub use error::AnalysisError;
pub use plot::{BodePlot, BodePlotter, JsonPlotWriter};
pub use signal::SampledSignal;
pub use sweep::{
    run_bode_sweep, simulate_bode_sweep, BodeResponse, FrequencySweep, SweepSettings,
};
