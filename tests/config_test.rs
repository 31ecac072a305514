// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use span_analyzer::config::{Config, DeviceConfig, SimulationConfig, SweepConfig, SystemModel};
use span_analyzer::utility::waveform::WaveformKind;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let config = Config {
        device: DeviceConfig {
            name: "Dev3".to_string(),
            sample_rate: 50_000,
        },
        sweep: SweepConfig {
            waveform: WaveformKind::InverseSawtooth,
            points: 11,
            stop_exponent: 3.0,
            write_channel: "AO1".to_string(),
            read_channel: "Dev3/AI2".to_string(),
            ..SweepConfig::default()
        },
        simulation: SimulationConfig {
            model: SystemModel::Gain,
            gain: 0.5,
            ..SimulationConfig::default()
        },
    };

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;
    assert_eq!(loaded_config, config);

    // Missing files are created with the defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config, Config::default());
    assert_eq!(default_config.device.name, "myDAQ1");
    assert_eq!(default_config.device.sample_rate, 200_000);

    Ok(())
}

#[test]
fn test_missing_sections_use_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("partial.yaml");
    std::fs::write(
        &config_path,
        r#"
device:
  name: "myDAQ2"
  sample_rate: 100000
"#,
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.device.name, "myDAQ2");
    assert_eq!(config.sweep, SweepConfig::default());
    assert_eq!(config.simulation, SimulationConfig::default());
    Ok(())
}

#[test]
fn test_apply_args() {
    let mut config = Config::default();

    config.apply_args(None, None, None, None, None, None);
    assert_eq!(config, Config::default());

    config.apply_args(
        Some("myDAQ9".to_string()),
        Some(20_000),
        Some(1.0),
        Some(3.0),
        Some(9),
        Some(2.5),
    );
    assert_eq!(config.device.name, "myDAQ9");
    assert_eq!(config.device.sample_rate, 20_000);
    assert_eq!(config.sweep.start_exponent, 1.0);
    assert_eq!(config.sweep.stop_exponent, 3.0);
    assert_eq!(config.sweep.points, 9);
    assert_eq!(config.sweep.bandwidth, 2.5);

    let frequencies = config.sweep.frequencies();
    assert_eq!(frequencies.len(), 9);
    assert_eq!(frequencies.frequencies()[0], 10.0);
    assert_eq!(frequencies.frequencies()[8], 1000.0);
}

#[test]
fn test_sweep_settings_follow_config() {
    let config = SweepConfig {
        amplitude: 0.2,
        phase_offset: -0.1,
        ..SweepConfig::default()
    };
    let settings = config.settings();
    assert_eq!(settings.amplitude, 0.2);
    assert_eq!(settings.phase_offset, -0.1);
    assert_eq!(settings.write_channel, "AO0");
    assert_eq!(settings.read_channel, "AI0");
    assert_eq!(settings.waveform, WaveformKind::Sine);
}
