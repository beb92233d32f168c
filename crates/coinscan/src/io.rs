//! JSON configuration and report helpers.

use std::{
    fs,
    path::{Path, PathBuf},
};

use coinscan_core::CircleItem;
use coinscan_euro::{Calibration, Cents};
use serde::{Deserialize, Serialize};

use crate::{CoinDetectError, CoinDetector, CoinDetectorParams, CoinReport, DetectedCoin};

#[derive(thiserror::Error, Debug)]
pub enum CoinIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
}

/// Configuration of one detection run, loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetectConfig {
    pub edge_image_path: String,
    pub color_image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Previously saved calibration. Without it the run calibrates on its own frame.
    #[serde(default)]
    pub calibration_path: Option<String>,
    #[serde(default)]
    pub detector: CoinDetectorParams,
}

impl CoinDetectConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CoinIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CoinIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("coin_detect_report.json"))
    }

    pub fn build_detector(&self) -> CoinDetector {
        CoinDetector::new(self.detector.clone())
    }
}

/// Read a calibration saved with [`write_calibration`].
pub fn load_calibration(path: impl AsRef<Path>) -> Result<Calibration, CoinIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_calibration(
    calibration: &Calibration,
    path: impl AsRef<Path>,
) -> Result<(), CoinIoError> {
    let json = serde_json::to_string_pretty(calibration)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetectReport {
    pub edge_image_path: String,
    pub color_image_path: String,
    #[serde(default)]
    pub config_path: Option<String>,
    #[serde(default)]
    pub reference: Option<CircleItem>,
    #[serde(default)]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub coins: Vec<DetectedCoin>,
    #[serde(default)]
    pub total: Cents,
    #[serde(default)]
    pub error: Option<String>,
}

impl CoinDetectReport {
    pub fn new(edge_image_path: &str, color_image_path: &str) -> Self {
        Self {
            edge_image_path: edge_image_path.to_string(),
            color_image_path: color_image_path.to_string(),
            config_path: None,
            reference: None,
            calibration: None,
            coins: Vec::new(),
            total: Cents(0),
            error: None,
        }
    }

    /// Build a base report from a config file.
    pub fn from_config(cfg: &CoinDetectConfig, config_path: &Path) -> Self {
        let mut report = Self::new(&cfg.edge_image_path, &cfg.color_image_path);
        report.config_path = Some(config_path.to_string_lossy().into_owned());
        report
    }

    /// Populate coins and total from a successful detection.
    pub fn set_detection(&mut self, res: CoinReport) {
        self.total = res.total();
        self.coins = res.coins;
        self.error = None;
    }

    /// Record a detection error.
    pub fn set_error(&mut self, err: CoinDetectError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CoinIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CoinIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
