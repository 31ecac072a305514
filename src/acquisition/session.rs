// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::fmt;

use log::debug;
use ndarray::{Array2, ArrayView2};

use super::channels::{resolve_channels, validate_device_name};
use super::task::{DaqBackend, DaqTask, TaskGuard};
use super::{AcquisitionError, AcquisitionSession};
use crate::config::DeviceConfig;
use crate::utility::waveform::duration_to_samples;

/// Acquisition session on one named device
///
/// Every call opens its own tasks and releases them before returning.
pub struct DaqSession<B: DaqBackend> {
    backend: B,
    device: String,
    sample_rate: u32,
}

impl<B: DaqBackend> DaqSession<B> {
    /// Validate `device` and bind it to `backend`
    ///
    /// No backend call is made.
    pub fn new(backend: B, device: &DeviceConfig) -> Result<Self, AcquisitionError> {
        validate_device_name(&device.name)?;
        if device.sample_rate == 0 {
            return Err(AcquisitionError::InvalidSampleRate(device.sample_rate));
        }
        Ok(Self {
            backend,
            device: device.name.clone(),
            sample_rate: device.sample_rate,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn open_task(&self, name: &str) -> Result<TaskGuard<B::Task>, AcquisitionError> {
        let task = self.backend.create_task(name)?;
        Ok(TaskGuard::new(name, task))
    }

    fn check_buffer(samples: &ArrayView2<f64>, channels: usize) -> Result<usize, AcquisitionError> {
        let (rows, columns) = samples.dim();
        if rows != channels {
            return Err(AcquisitionError::ChannelCountMismatch { rows, channels });
        }
        if columns == 0 {
            return Err(AcquisitionError::EmptyBuffer);
        }
        Ok(columns)
    }
}

impl<B: DaqBackend> AcquisitionSession for DaqSession<B> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write(&mut self, samples: ArrayView2<f64>, channels: &[&str]) -> Result<(), AcquisitionError> {
        let physical = resolve_channels(&self.device, channels)?;
        let count = Self::check_buffer(&samples, physical.len())?;
        debug!("Writing {} samples to {:?}", count, physical);

        let mut task = self.open_task("writeOnly")?;
        for channel in &physical {
            task.add_ao_voltage_channel(channel)?;
        }
        task.configure_timing(self.sample_rate, count)?;
        task.write(samples, true)?;
        task.wait_until_done()?;
        task.finish()
    }

    fn read(&mut self, duration: f64, channels: &[&str]) -> Result<Array2<f64>, AcquisitionError> {
        let physical = resolve_channels(&self.device, channels)?;
        let count = duration_to_samples(self.sample_rate, duration);
        if count == 0 {
            return Err(AcquisitionError::InvalidDuration(duration));
        }
        debug!("Reading {} samples from {:?}", count, physical);

        let mut task = self.open_task("readOnly")?;
        for channel in &physical {
            task.add_ai_voltage_channel(channel)?;
        }
        task.configure_timing(self.sample_rate, count)?;
        let data = task.read(count)?;
        task.finish()?;
        Ok(data)
    }

    fn readwrite(
        &mut self,
        samples: ArrayView2<f64>,
        read_channels: &[&str],
        write_channels: &[&str],
    ) -> Result<Array2<f64>, AcquisitionError> {
        let outputs = resolve_channels(&self.device, write_channels)?;
        let inputs = resolve_channels(&self.device, read_channels)?;
        let count = Self::check_buffer(&samples, outputs.len())?;
        debug!(
            "Writing {} samples to {:?} while reading {:?}",
            count, outputs, inputs
        );

        let mut write_task = self.open_task("write")?;
        let mut read_task = self.open_task("read")?;
        for channel in &outputs {
            write_task.add_ao_voltage_channel(channel)?;
        }
        for channel in &inputs {
            read_task.add_ai_voltage_channel(channel)?;
        }
        write_task.configure_timing(self.sample_rate, count)?;
        read_task.configure_timing(self.sample_rate, count)?;

        // The read blocks until the generation has been captured
        write_task.write(samples, true)?;
        let data = read_task.read(count)?;

        read_task.finish()?;
        write_task.finish()?;
        Ok(data)
    }
}

impl<B: DaqBackend> fmt::Display for DaqSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "DAQ session";
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f, "Device: {}", self.device)?;
        write!(f, "Sample rate: {} Hz", self.sample_rate)
    }
}
