// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Driver tasks and their scoped lifetime
//!
//! A [`DaqBackend`] hands out [`DaqTask`]s, each owning a set of physical
//! channels and a finite sample clock. A task must be stopped and closed
//! once it is no longer needed; [`TaskGuard`] does this when it goes out of
//! scope, whichever way the scope is left.

use std::ops::{Deref, DerefMut};

use log::{debug, warn};
use ndarray::{Array2, ArrayView2};

use super::AcquisitionError;

/// Vendor-like driver able to create tasks
pub trait DaqBackend {
    type Task: DaqTask;

    /// Create an empty task named `name`
    fn create_task(&self, name: &str) -> Result<Self::Task, AcquisitionError>;
}

/// One acquisition or generation job on a device
pub trait DaqTask {
    /// Add an analog output voltage channel by physical name
    fn add_ao_voltage_channel(&mut self, physical_channel: &str) -> Result<(), AcquisitionError>;

    /// Add an analog input voltage channel by physical name
    fn add_ai_voltage_channel(&mut self, physical_channel: &str) -> Result<(), AcquisitionError>;

    /// Configure a finite sample clock
    fn configure_timing(
        &mut self,
        sample_rate: u32,
        samples_per_channel: usize,
    ) -> Result<(), AcquisitionError>;

    /// Load one row per channel; with `auto_start` the task starts emitting
    /// without waiting
    fn write(&mut self, data: ArrayView2<f64>, auto_start: bool) -> Result<(), AcquisitionError>;

    fn start(&mut self) -> Result<(), AcquisitionError>;

    /// Block until a finite generation has emitted every sample
    fn wait_until_done(&mut self) -> Result<(), AcquisitionError>;

    /// Block until `samples_per_channel` samples are available on every
    /// channel and return them, one row per channel
    fn read(&mut self, samples_per_channel: usize) -> Result<Array2<f64>, AcquisitionError>;

    fn stop(&mut self) -> Result<(), AcquisitionError>;

    /// Release the task; no call is valid afterwards
    fn close(&mut self) -> Result<(), AcquisitionError>;
}

/// Owns a task and releases it exactly once
pub struct TaskGuard<T: DaqTask> {
    name: String,
    task: T,
    released: bool,
}

impl<T: DaqTask> TaskGuard<T> {
    pub fn new(name: impl Into<String>, task: T) -> Self {
        let name = name.into();
        debug!("Task '{}' opened", name);
        Self {
            name,
            task,
            released: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop and close the task, reporting failures to the caller
    pub fn finish(mut self) -> Result<(), AcquisitionError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), AcquisitionError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let stopped = self.task.stop();
        let closed = self.task.close();
        debug!("Task '{}' closed", self.name);
        stopped.and(closed)
    }
}

impl<T: DaqTask> Deref for TaskGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.task
    }
}

impl<T: DaqTask> DerefMut for TaskGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.task
    }
}

impl<T: DaqTask> Drop for TaskGuard<T> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release task '{}': {}", self.name, e);
        }
    }
}
