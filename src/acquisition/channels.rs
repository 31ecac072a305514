// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device and channel name handling

use super::AcquisitionError;

/// Check that `name` can be used as a device name
///
/// Device names are non-blank and contain neither whitespace nor `/`.
pub fn validate_device_name(name: &str) -> Result<(), AcquisitionError> {
    if name.trim().is_empty() {
        return Err(AcquisitionError::DeviceNameUnset);
    }
    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(AcquisitionError::InvalidDeviceName(name.to_string()));
    }
    Ok(())
}

/// Physical name of `channel` on `device`
///
/// A channel that already mentions the device is used as given, anything
/// else is prefixed with `"{device}/"`.
pub fn resolve_channel(device: &str, channel: &str) -> Result<String, AcquisitionError> {
    let malformed = channel.trim().is_empty()
        || channel.chars().any(char::is_whitespace)
        || channel.starts_with('/')
        || channel.ends_with('/')
        || channel.contains("//");
    if malformed {
        return Err(AcquisitionError::InvalidChannel(channel.to_string()));
    }

    if channel.contains(device) {
        Ok(channel.to_string())
    } else {
        Ok(format!("{}/{}", device, channel))
    }
}

/// Resolve every channel of a task, refusing an empty list
pub fn resolve_channels(device: &str, channels: &[&str]) -> Result<Vec<String>, AcquisitionError> {
    if channels.is_empty() {
        return Err(AcquisitionError::NoChannels);
    }
    channels
        .iter()
        .map(|channel| resolve_channel(device, channel))
        .collect()
}
