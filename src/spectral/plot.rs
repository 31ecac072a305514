// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the span-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Numeric data behind a Bode plot
//!
//! Rendering is left to external tools. A [`BodePlotter`] receives a
//! [`BodePlot`] holding everything a plot needs: the angular frequency
//! axis, the measured magnitude (linear and dB) and phase, and optionally
//! the response of a reference model evaluated on the same axis.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::sweep::BodeResponse;
use crate::utility::lti::LinearSystem;

/// Analytic response of a model on the plot axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticOverlay {
    pub magnitudes: Vec<f64>,
    pub magnitudes_db: Vec<f64>,
    pub phases: Vec<f64>,
}

/// Plot-ready arrays of a measured frequency response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodePlot {
    /// When the plot data was assembled
    pub timestamp: DateTime<Utc>,
    /// Frequency axis in rad/s
    pub angular_frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    pub magnitudes_db: Vec<f64>,
    /// Phase in radians
    pub phases: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytic: Option<AnalyticOverlay>,
}

impl BodePlot {
    /// Assemble plot data from a response, with an optional model overlay
    pub fn from_response(response: &BodeResponse, model: Option<&dyn LinearSystem>) -> Self {
        let angular_frequencies = response.angular_frequencies();

        let analytic = model.map(|system| {
            let values: Vec<_> = angular_frequencies
                .iter()
                .map(|&w| system.response(w))
                .collect();
            AnalyticOverlay {
                magnitudes: values.iter().map(|h| h.norm()).collect(),
                magnitudes_db: values.iter().map(|h| 20.0 * h.norm().log10()).collect(),
                phases: values.iter().map(|h| h.arg()).collect(),
            }
        });

        Self {
            timestamp: Utc::now(),
            angular_frequencies,
            magnitudes: response.magnitudes(),
            magnitudes_db: response.magnitudes_db(),
            phases: response.phases(),
            analytic,
        }
    }

    pub fn len(&self) -> usize {
        self.angular_frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angular_frequencies.is_empty()
    }
}

/// Consumer of plot data
pub trait BodePlotter {
    fn render(&mut self, plot: &BodePlot) -> Result<()>;
}

/// Writes plot data as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonPlotWriter {
    path: PathBuf,
}

impl JsonPlotWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BodePlotter for JsonPlotWriter {
    fn render(&mut self, plot: &BodePlot) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create plot file: {}", self.path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), plot)
            .with_context(|| format!("Failed to write plot data to {}", self.path.display()))?;

        info!(
            "Wrote {} plot points to {}",
            plot.len(),
            self.path.display()
        );
        Ok(())
    }
}
