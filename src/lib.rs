// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Span analyzer library
//!
//! This library drives a DAQ device to excite a system under test, captures
//! its response, and extracts the frequency response (power ratio and phase)
//! needed for a Bode plot.
//!
//! - [`spectral`]: FFT, Bode analysis, sweeps and plot data
//! - [`acquisition`]: finite analog write/read sessions and a simulated device
//! - [`utility`]: waveform synthesis, noise and linear system models
//! - [`config`]: YAML configuration with schema validation

pub mod acquisition;
pub mod config;
pub mod spectral;
pub mod utility;
