// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Utility module for signal synthesis and system models used throughout the project

pub mod lti;
pub mod noise_generator;
pub mod waveform;
pub mod wav;

// Re-exports for use in other modules
pub use lti::{FirstOrderLowPass, Gain, LinearSystem};
pub use waveform::{generate_waveform, WaveformDescriptor, WaveformError, WaveformKind};
