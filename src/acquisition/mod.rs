// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Analog acquisition module
//!
//! This module handles finite analog generation and acquisition on a DAQ
//! device. [`AcquisitionSession`] is the surface the sweep driver talks to;
//! [`DaqSession`] implements it over any [`DaqBackend`], and
//! [`SimulatedBackend`] provides a loopback device for tests and offline
//! runs.
//!
//! Reads block until every requested sample has been collected. No timeout
//! is applied.

mod channels;
mod session;
mod simulated;
mod task;

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

pub use channels::{resolve_channel, resolve_channels, validate_device_name};
pub use session::DaqSession;
pub use simulated::{SimulatedBackend, SimulatedTask};
pub use task::{DaqBackend, DaqTask, TaskGuard};

/// Errors raised while configuring or running acquisition tasks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("Device name is not set")]
    DeviceNameUnset,

    #[error("Invalid device name: '{0}'")]
    InvalidDeviceName(String),

    #[error("Invalid sample rate: {0} (must be a positive integer)")]
    InvalidSampleRate(u32),

    #[error("Invalid channel name: '{0}'")]
    InvalidChannel(String),

    #[error("Unknown channel: '{0}'")]
    UnknownChannel(String),

    #[error("No channel given")]
    NoChannels,

    #[error("Buffer has {rows} rows for {channels} channels")]
    ChannelCountMismatch { rows: usize, channels: usize },

    #[error("Buffer holds no samples")]
    EmptyBuffer,

    #[error("Duration of {0} s holds no sample")]
    InvalidDuration(f64),

    #[error("Invalid task state: {0}")]
    TaskState(String),

    #[error("Driver error: {0}")]
    Backend(String),
}

/// Synchronized finite write/read on named channels
pub trait AcquisitionSession {
    /// Sample clock rate in Hz
    fn sample_rate(&self) -> u32;

    /// Emit `samples` (one row per channel) and block until done
    fn write(&mut self, samples: ArrayView2<f64>, channels: &[&str]) -> Result<(), AcquisitionError>;

    /// Collect `duration · sample_rate` samples (floored) on every channel
    fn read(&mut self, duration: f64, channels: &[&str]) -> Result<Array2<f64>, AcquisitionError>;

    /// Start emitting `samples` and capture as many samples on `read_channels`
    fn readwrite(
        &mut self,
        samples: ArrayView2<f64>,
        read_channels: &[&str],
        write_channels: &[&str],
    ) -> Result<Array2<f64>, AcquisitionError>;
}
