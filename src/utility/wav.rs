// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! WAV storage of sampled voltages
//!
//! Signals are written as 32-bit float WAV files so that voltages survive
//! without rescaling. Integer files are read back normalized to [-1, 1).

use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Channels of a WAV file, de-interleaved
#[derive(Debug, Clone, PartialEq)]
pub struct WavSignals {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f64>>,
}

/// Write equally long channels to a 32-bit float WAV file
pub fn write_channels<P: AsRef<Path>>(path: P, sample_rate: u32, channels: &[&[f64]]) -> Result<()> {
    let path = path.as_ref();
    let Some(first) = channels.first() else {
        bail!("No channel to write to {}", path.display());
    };
    if channels.iter().any(|c| c.len() != first.len()) {
        bail!("Channels written to {} differ in length", path.display());
    }
    let channel_count = u16::try_from(channels.len()).context("Too many channels")?;

    let spec = WavSpec {
        channels: channel_count,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;

    for i in 0..first.len() {
        for channel in channels {
            writer.write_sample(channel[i] as f32)?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file {}", path.display()))?;
    Ok(())
}

/// Read every channel of a WAV file
pub fn read_channels<P: AsRef<Path>>(path: P) -> Result<WavSignals> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        bail!("WAV file {} declares no channel", path.display());
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 2f64.powi(spec.bits_per_sample as i32 - 1);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &value) in channels.iter_mut().zip(frame) {
            channel.push(value);
        }
    }

    Ok(WavSignals {
        sample_rate: spec.sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_channels_survive_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signal.wav");

        let output = [0.5, -1.25, 2.0];
        let input = [0.25, 0.0, -0.75];
        write_channels(&path, 48_000, &[&output, &input]).unwrap();

        let signals = read_channels(&path).unwrap();
        assert_eq!(signals.sample_rate, 48_000);
        assert_eq!(signals.channels, vec![output.to_vec(), input.to_vec()]);
    }

    #[test]
    fn test_integer_files_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcm.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [16384i16, -32768, 0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let signals = read_channels(&path).unwrap();
        assert_eq!(signals.channels, vec![vec![0.5, -1.0, 0.0]]);
    }

    #[test]
    fn test_mismatched_channels_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        assert!(write_channels(&path, 1000, &[&[1.0, 2.0], &[1.0]]).is_err());
        assert!(write_channels(&path, 1000, &[]).is_err());
    }
}
