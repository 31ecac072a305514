// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated DAQ device
//!
//! A loopback device with two analog outputs (`ao0`, `ao1`) and four analog
//! inputs (`ai0` to `ai3`). An input can be wired to an output through a
//! [`LinearSystem`], standing in for the device under test:
//!
//! ```text
//!   ao0 ──► LinearSystem ──► (+ noise) ──► ai0
//! ```
//!
//! While a generation is running on an output, a read on a wired input
//! returns the system's response to the emitted buffer. Once the
//! generation is stopped, the output holds its last value. Unwired inputs
//! read 0 V plus noise.
//!
//! The device counts open tasks, which lets tests check that every task
//! handed out was closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};
use ndarray::{Array2, ArrayView2};

use super::task::{DaqBackend, DaqTask};
use super::AcquisitionError;
use crate::utility::lti::LinearSystem;
use crate::utility::noise_generator::NoiseGenerator;

const OUTPUT_CHANNELS: [&str; 2] = ["ao0", "ao1"];
const INPUT_CHANNELS: [&str; 4] = ["ai0", "ai1", "ai2", "ai3"];

#[derive(Debug, Default, Clone)]
struct OutputState {
    buffer: Vec<f64>,
    sample_rate: u32,
    running: bool,
    held_level: f64,
}

#[derive(Debug, Clone)]
struct Wiring {
    source: String,
    system: Arc<dyn LinearSystem>,
}

#[derive(Debug)]
struct DeviceState {
    outputs: HashMap<String, OutputState>,
    wiring: HashMap<String, Wiring>,
    noise: Option<(f64, NoiseGenerator)>,
    open_tasks: usize,
    created_tasks: usize,
    fail_reads: bool,
}

/// In-memory DAQ device
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    name: String,
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedBackend {
    /// Device named `name` with nothing wired
    pub fn new(name: impl Into<String>) -> Self {
        let outputs = OUTPUT_CHANNELS
            .iter()
            .map(|c| (c.to_string(), OutputState::default()))
            .collect();
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(DeviceState {
                outputs,
                wiring: HashMap::new(),
                noise: None,
                open_tasks: 0,
                created_tasks: 0,
                fail_reads: false,
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route `output` into `input` through `system`
    pub fn connect(
        self,
        output: &str,
        input: &str,
        system: Arc<dyn LinearSystem>,
    ) -> Result<Self, AcquisitionError> {
        let source = known_channel(output, &OUTPUT_CHANNELS)?;
        let sink = known_channel(input, &INPUT_CHANNELS)?;
        info!(
            "Simulated device '{}': {} wired to {} through {:?}",
            self.name, source, sink, system
        );
        self.lock()?.wiring.insert(sink, Wiring { source, system });
        Ok(self)
    }

    /// Add Gaussian noise of standard deviation `sigma` volts to every read
    pub fn with_noise(self, sigma: f64, seed: u32) -> Result<Self, AcquisitionError> {
        {
            let mut state = self.lock()?;
            state.noise = (sigma > 0.0).then(|| (sigma, NoiseGenerator::new(seed)));
        }
        Ok(self)
    }

    /// Make every following read fail, for exercising error paths
    pub fn fail_reads(&self, fail: bool) -> Result<(), AcquisitionError> {
        self.lock()?.fail_reads = fail;
        Ok(())
    }

    /// Tasks created and not yet closed
    pub fn open_tasks(&self) -> usize {
        self.lock().map(|s| s.open_tasks).unwrap_or(usize::MAX)
    }

    /// Tasks created since the device was built
    pub fn created_tasks(&self) -> usize {
        self.lock().map(|s| s.created_tasks).unwrap_or(0)
    }

    /// Level currently held by `output`, if it is not generating
    pub fn output_level(&self, output: &str) -> Result<Option<f64>, AcquisitionError> {
        let channel = known_channel(output, &OUTPUT_CHANNELS)?;
        let state = self.lock()?;
        Ok(state
            .outputs
            .get(&channel)
            .filter(|o| !o.running)
            .map(|o| o.held_level))
    }

    fn lock(&self) -> Result<MutexGuard<'_, DeviceState>, AcquisitionError> {
        lock_state(&self.state)
    }
}

impl DaqBackend for SimulatedBackend {
    type Task = SimulatedTask;

    fn create_task(&self, name: &str) -> Result<SimulatedTask, AcquisitionError> {
        let mut state = self.lock()?;
        state.open_tasks += 1;
        state.created_tasks += 1;
        debug!("Simulated task '{}' created ({} open)", name, state.open_tasks);

        Ok(SimulatedTask {
            name: name.to_string(),
            device: self.name.clone(),
            state: Arc::clone(&self.state),
            direction: None,
            channels: Vec::new(),
            timing: None,
            running: false,
            closed: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Output,
    Input,
}

/// Task on a [`SimulatedBackend`]
#[derive(Debug)]
pub struct SimulatedTask {
    name: String,
    device: String,
    state: Arc<Mutex<DeviceState>>,
    direction: Option<Direction>,
    channels: Vec<String>,
    timing: Option<(u32, usize)>,
    running: bool,
    closed: bool,
}

impl SimulatedTask {
    fn ensure_open(&self) -> Result<(), AcquisitionError> {
        if self.closed {
            Err(AcquisitionError::TaskState(format!(
                "task '{}' is closed",
                self.name
            )))
        } else {
            Ok(())
        }
    }

    fn add_channel(
        &mut self,
        physical_channel: &str,
        direction: Direction,
        known: &[&str],
    ) -> Result<(), AcquisitionError> {
        self.ensure_open()?;
        if self.direction.is_some_and(|d| d != direction) {
            return Err(AcquisitionError::TaskState(format!(
                "task '{}' cannot mix analog inputs and outputs",
                self.name
            )));
        }

        let local = physical_channel
            .strip_prefix(&self.device)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| AcquisitionError::UnknownChannel(physical_channel.to_string()))?;
        let channel = known_channel(local, known)
            .map_err(|_| AcquisitionError::UnknownChannel(physical_channel.to_string()))?;

        self.direction = Some(direction);
        self.channels.push(channel);
        Ok(())
    }

    fn require_timing(&self) -> Result<(u32, usize), AcquisitionError> {
        self.timing.ok_or_else(|| {
            AcquisitionError::TaskState(format!("task '{}' has no sample clock", self.name))
        })
    }

    fn set_outputs_running(&self, running: bool) -> Result<(), AcquisitionError> {
        let mut state = lock_state(&self.state)?;
        for channel in &self.channels {
            if let Some(output) = state.outputs.get_mut(channel) {
                if output.running && !running {
                    output.held_level = output.buffer.last().copied().unwrap_or(output.held_level);
                }
                output.running = running;
            }
        }
        Ok(())
    }
}

impl DaqTask for SimulatedTask {
    fn add_ao_voltage_channel(&mut self, physical_channel: &str) -> Result<(), AcquisitionError> {
        self.add_channel(physical_channel, Direction::Output, &OUTPUT_CHANNELS)
    }

    fn add_ai_voltage_channel(&mut self, physical_channel: &str) -> Result<(), AcquisitionError> {
        self.add_channel(physical_channel, Direction::Input, &INPUT_CHANNELS)
    }

    fn configure_timing(
        &mut self,
        sample_rate: u32,
        samples_per_channel: usize,
    ) -> Result<(), AcquisitionError> {
        self.ensure_open()?;
        if sample_rate == 0 {
            return Err(AcquisitionError::InvalidSampleRate(sample_rate));
        }
        self.timing = Some((sample_rate, samples_per_channel));
        Ok(())
    }

    fn write(&mut self, data: ArrayView2<f64>, auto_start: bool) -> Result<(), AcquisitionError> {
        self.ensure_open()?;
        if self.direction != Some(Direction::Output) {
            return Err(AcquisitionError::TaskState(format!(
                "task '{}' has no analog output channel",
                self.name
            )));
        }
        let (rate, _) = self.require_timing()?;
        let (rows, _) = data.dim();
        if rows != self.channels.len() {
            return Err(AcquisitionError::ChannelCountMismatch {
                rows,
                channels: self.channels.len(),
            });
        }

        {
            let mut state = lock_state(&self.state)?;
            for (channel, row) in self.channels.iter().zip(data.rows()) {
                if let Some(output) = state.outputs.get_mut(channel) {
                    output.buffer = row.to_vec();
                    output.sample_rate = rate;
                }
            }
        }

        if auto_start {
            self.start()?;
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), AcquisitionError> {
        self.ensure_open()?;
        self.require_timing()?;
        if self.direction == Some(Direction::Output) {
            self.set_outputs_running(true)?;
        }
        self.running = true;
        Ok(())
    }

    fn wait_until_done(&mut self) -> Result<(), AcquisitionError> {
        self.ensure_open()?;
        if !self.running {
            return Err(AcquisitionError::TaskState(format!(
                "task '{}' was never started",
                self.name
            )));
        }
        Ok(())
    }

    fn read(&mut self, samples_per_channel: usize) -> Result<Array2<f64>, AcquisitionError> {
        self.ensure_open()?;
        if self.direction != Some(Direction::Input) {
            return Err(AcquisitionError::TaskState(format!(
                "task '{}' has no analog input channel",
                self.name
            )));
        }
        let (rate, _) = self.require_timing()?;
        self.running = true;

        let mut state = lock_state(&self.state)?;
        if state.fail_reads {
            return Err(AcquisitionError::Backend(format!(
                "simulated read failure on task '{}'",
                self.name
            )));
        }

        let mut data = Array2::zeros((self.channels.len(), samples_per_channel));
        for (channel, mut row) in self.channels.iter().zip(data.rows_mut()) {
            let Some(wiring) = state.wiring.get(channel) else {
                continue;
            };
            let Some(output) = state.outputs.get(&wiring.source) else {
                continue;
            };

            let excitation: Vec<f64> = if output.running {
                let last = output.buffer.last().copied().unwrap_or(output.held_level);
                (0..samples_per_channel)
                    .map(|i| output.buffer.get(i).copied().unwrap_or(last))
                    .collect()
            } else {
                vec![output.held_level; samples_per_channel]
            };

            let response = wiring.system.simulate(&excitation, rate);
            for (target, value) in row.iter_mut().zip(response) {
                *target = value;
            }
        }

        if let Some((sigma, generator)) = state.noise.as_mut() {
            for mut row in data.rows_mut() {
                if let Some(values) = row.as_slice_mut() {
                    generator.add_to(values, *sigma);
                } else {
                    row.mapv_inplace(|v| v + generator.random_gaussian() * *sigma);
                }
            }
        }

        Ok(data)
    }

    fn stop(&mut self) -> Result<(), AcquisitionError> {
        if self.closed || !self.running {
            return Ok(());
        }
        if self.direction == Some(Direction::Output) {
            self.set_outputs_running(false)?;
        }
        self.running = false;
        Ok(())
    }

    fn close(&mut self) -> Result<(), AcquisitionError> {
        if self.closed {
            return Ok(());
        }
        self.stop()?;
        self.closed = true;

        let mut state = lock_state(&self.state)?;
        state.open_tasks = state.open_tasks.saturating_sub(1);
        debug!(
            "Simulated task '{}' closed ({} open)",
            self.name, state.open_tasks
        );
        Ok(())
    }
}

fn lock_state(state: &Mutex<DeviceState>) -> Result<MutexGuard<'_, DeviceState>, AcquisitionError> {
    state
        .lock()
        .map_err(|_| AcquisitionError::Backend("simulated device state is poisoned".to_string()))
}

fn known_channel(channel: &str, known: &[&str]) -> Result<String, AcquisitionError> {
    let lower = channel.to_ascii_lowercase();
    if known.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(AcquisitionError::UnknownChannel(channel.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::lti::Gain;
    use ndarray::array;

    fn loopback(gain: f64) -> SimulatedBackend {
        SimulatedBackend::new("sim")
            .connect("AO0", "AI0", Arc::new(Gain(gain)))
            .unwrap()
    }

    #[test]
    fn test_running_output_reaches_wired_input() {
        let backend = loopback(2.0);
        let mut write = backend.create_task("w").unwrap();
        write.add_ao_voltage_channel("sim/AO0").unwrap();
        write.configure_timing(1000, 3).unwrap();
        write.write(array![[0.1, 0.2, 0.3]].view(), true).unwrap();

        let mut read = backend.create_task("r").unwrap();
        read.add_ai_voltage_channel("sim/AI0").unwrap();
        read.add_ai_voltage_channel("sim/ai1").unwrap();
        read.configure_timing(1000, 3).unwrap();
        let data = read.read(3).unwrap();

        assert_eq!(data.row(0).to_vec(), vec![0.2, 0.4, 0.6]);
        assert_eq!(data.row(1).to_vec(), vec![0.0, 0.0, 0.0]);

        read.close().unwrap();
        write.close().unwrap();
        assert_eq!(backend.open_tasks(), 0);
        assert_eq!(backend.created_tasks(), 2);
    }

    #[test]
    fn test_stopped_output_holds_last_value() {
        let backend = loopback(1.0);
        let mut write = backend.create_task("w").unwrap();
        write.add_ao_voltage_channel("sim/ao0").unwrap();
        write.configure_timing(1000, 2).unwrap();
        write.write(array![[1.0, -0.5]].view(), true).unwrap();
        assert_eq!(backend.output_level("ao0").unwrap(), None);
        write.stop().unwrap();
        write.close().unwrap();

        assert_eq!(backend.output_level("ao0").unwrap(), Some(-0.5));

        let mut read = backend.create_task("r").unwrap();
        read.add_ai_voltage_channel("sim/ai0").unwrap();
        read.configure_timing(1000, 4).unwrap();
        assert_eq!(read.read(4).unwrap().row(0).to_vec(), vec![-0.5; 4]);
        read.close().unwrap();
    }

    #[test]
    fn test_channel_checks() {
        let backend = SimulatedBackend::new("sim");
        let mut task = backend.create_task("t").unwrap();
        assert_eq!(
            task.add_ao_voltage_channel("sim/AO7"),
            Err(AcquisitionError::UnknownChannel("sim/AO7".to_string()))
        );
        assert_eq!(
            task.add_ao_voltage_channel("other/AO0"),
            Err(AcquisitionError::UnknownChannel("other/AO0".to_string()))
        );
        task.add_ao_voltage_channel("sim/AO0").unwrap();
        assert!(matches!(
            task.add_ai_voltage_channel("sim/AI0"),
            Err(AcquisitionError::TaskState(_))
        ));
        task.close().unwrap();
        assert!(matches!(
            task.configure_timing(1000, 1),
            Err(AcquisitionError::TaskState(_))
        ));
    }

    #[test]
    fn test_noise_is_reproducible() {
        let read_once = || {
            let backend = SimulatedBackend::new("sim").with_noise(0.1, 99).unwrap();
            let mut read = backend.create_task("r").unwrap();
            read.add_ai_voltage_channel("sim/ai2").unwrap();
            read.configure_timing(1000, 16).unwrap();
            let data = read.read(16).unwrap();
            read.close().unwrap();
            data
        };

        let first = read_once();
        assert_eq!(first, read_once());
        assert!(first.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_connect_rejects_unknown_channels() {
        let result = SimulatedBackend::new("sim").connect("ao0", "ai9", Arc::new(Gain(1.0)));
        assert!(matches!(result, Err(AcquisitionError::UnknownChannel(_))));
    }
}
