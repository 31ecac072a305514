// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! DAQ device configuration

use serde::{Deserialize, Serialize};

/// Identification and clock of the DAQ device.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Device name as known to the driver, e.g. `myDAQ1`.
    ///
    /// Channels given without a device prefix are resolved against it.
    pub name: String,

    /// Sample clock rate in Hz, shared by generation and acquisition.
    pub sample_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "myDAQ1".to_string(),
            sample_rate: 200_000,
        }
    }
}
