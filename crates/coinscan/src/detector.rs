//! Coin detection pipeline: reference calibration, circle sweep, valuation.

use std::fmt;

use coinscan_core::{CircleItem, GrayImageView, ImageError, RgbImageView};
use coinscan_euro::{
    is_off_frame, sample_coin_colors, Calibration, CalibrationError, Cents, CoinCatalog,
    ColorNames, ColorSample, ColorThresholds, SampleError,
};
use coinscan_hough::{
    find_circles_with, find_reference_circle, resolve_overlaps, HoughError, HoughParams,
    ReferenceSearchParams, SearchMode,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Configuration for the coin detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinDetectorParams {
    /// Accumulator resolution and peak budget for calibrated detection.
    pub hough: HoughParams,
    pub mode: SearchMode,
    /// Radius range swept to find the calibration coin.
    pub reference: ReferenceSearchParams,
    /// Value of the calibration coin.
    pub reference_value: Cents,
    /// Slack around calibrated radii, in pixels.
    pub radius_tolerance_px: i32,
    /// Peak budget per radius when marking circles before calibration.
    pub max_count_uncalibrated: usize,
    pub colors: ColorThresholds,
    /// Balance samples against the reference coin's silver part.
    pub white_balance: bool,
    /// Position of the edge image's top-left pixel inside the color image.
    pub frame_origin: [i32; 2],
}

impl Default for CoinDetectorParams {
    fn default() -> Self {
        Self {
            hough: HoughParams::default(),
            mode: SearchMode::default(),
            reference: ReferenceSearchParams::default(),
            reference_value: Cents(100),
            radius_tolerance_px: 2,
            max_count_uncalibrated: 5,
            colors: ColorThresholds::default(),
            white_balance: true,
            frame_origin: [0, 0],
        }
    }
}

/// Errors returned by the coin detector.
#[derive(thiserror::Error, Debug)]
pub enum CoinDetectError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Hough(#[from] HoughError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error("detector is not calibrated")]
    NotCalibrated,
}

/// What became of one detected circle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CoinOutcome {
    Recognized {
        value: Cents,
        colors: ColorNames,
    },
    /// No catalog entry matches; `colors` is absent when the sample was dark.
    Unrecognized { colors: Option<ColorNames> },
    /// The circle's bounding box leaves the color image.
    OffFrame,
}

/// One resolved circle with its valuation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedCoin {
    /// Circle in color-image coordinates.
    pub circle: CircleItem,
    pub outcome: CoinOutcome,
    #[serde(default)]
    pub sample: Option<ColorSample>,
}

impl DetectedCoin {
    pub fn value(&self) -> Option<Cents> {
        match self.outcome {
            CoinOutcome::Recognized { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for DetectedCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            CoinOutcome::Recognized { value, colors } => write!(
                f,
                "{}: {} EUR ({}/{})",
                self.circle, value, colors.ring, colors.core
            ),
            CoinOutcome::Unrecognized { colors: Some(c) } => {
                write!(f, "{}: unrecognized ({}/{})", self.circle, c.ring, c.core)
            }
            CoinOutcome::Unrecognized { colors: None } => {
                write!(f, "{}: unrecognized", self.circle)
            }
            CoinOutcome::OffFrame => write!(f, "{}: off frame", self.circle),
        }
    }
}

/// All coins found in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinReport {
    pub coins: Vec<DetectedCoin>,
}

impl CoinReport {
    /// Sum of all recognized coins.
    pub fn total(&self) -> Cents {
        self.coins.iter().filter_map(DetectedCoin::value).sum()
    }

    pub fn recognized(&self) -> usize {
        self.coins.iter().filter(|c| c.value().is_some()).count()
    }

    pub fn unrecognized(&self) -> usize {
        self.coins
            .iter()
            .filter(|c| matches!(c.outcome, CoinOutcome::Unrecognized { .. }))
            .count()
    }

    pub fn off_frame(&self) -> usize {
        self.coins
            .iter()
            .filter(|c| c.outcome == CoinOutcome::OffFrame)
            .count()
    }
}

impl fmt::Display for CoinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.coins.iter().enumerate() {
            writeln!(f, "circle #{i} {coin}")?;
        }
        write!(
            f,
            "total: {} EUR ({} recognized, {} unrecognized, {} off frame)",
            self.total(),
            self.recognized(),
            self.unrecognized(),
            self.off_frame()
        )
    }
}

/// Euro coin detector.
///
/// Holds the catalog and the current calibration. A failed recalibration
/// leaves the previous calibration in place.
#[derive(Clone, Debug)]
pub struct CoinDetector {
    params: CoinDetectorParams,
    catalog: CoinCatalog,
    calibration: Option<Calibration>,
}

impl CoinDetector {
    pub fn new(params: CoinDetectorParams) -> Self {
        Self::with_catalog(params, CoinCatalog::euro())
    }

    pub fn with_catalog(params: CoinDetectorParams, catalog: CoinCatalog) -> Self {
        Self {
            params,
            catalog,
            calibration: None,
        }
    }

    pub fn params(&self) -> &CoinDetectorParams {
        &self.params
    }

    pub fn catalog(&self) -> &CoinCatalog {
        &self.catalog
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Install a previously computed calibration.
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = Some(calibration);
    }

    #[inline]
    fn to_color_frame(&self, circle: &CircleItem) -> CircleItem {
        let [dx, dy] = self.params.frame_origin;
        circle.translated(dx, dy)
    }

    /// Calibrate from a frame showing the reference coin.
    ///
    /// The strongest circle in the reference radius range fixes the pixel
    /// scale. Its colors are sampled for white balance when possible; a coin
    /// that cannot be sampled only disables the balance. Returns the
    /// reference circle in color-image coordinates.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, edges, color), fields(width = edges.width, height = edges.height))
    )]
    pub fn calibrate_from_frame(
        &mut self,
        edges: &GrayImageView<'_>,
        color: &RgbImageView<'_>,
    ) -> Result<CircleItem, CoinDetectError> {
        let found = find_reference_circle(edges, &self.params.reference, &self.params.hough)
            .inspect_err(|e| warn!("calibration rejected: {e}"))?;
        let reference = self.to_color_frame(&found);

        let mut calibration = self
            .catalog
            .calibrate(
                self.params.reference_value,
                reference.r,
                self.params.radius_tolerance_px,
            )
            .inspect_err(|e| warn!("calibration rejected: {e}"))?;

        match sample_coin_colors(color, reference.x, reference.y, reference.r) {
            Ok(sample) => {
                let value = self.params.reference_value;
                calibration = calibration.with_reference_colors(value, sample);
                if !self.params.white_balance {
                    calibration = calibration.without_white_balance();
                }
            }
            Err(e) => warn!("reference colors unavailable, no white balance: {e}"),
        }

        info!("calibrated on reference coin {reference}");
        self.calibration = Some(calibration);
        Ok(reference)
    }

    /// Mark circles without a calibration, over the reference radius range.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, edges), fields(width = edges.width, height = edges.height))
    )]
    pub fn detect_circles(
        &self,
        edges: &GrayImageView<'_>,
    ) -> Result<Vec<CircleItem>, CoinDetectError> {
        let params = self
            .params
            .hough
            .clone()
            .with_max_count(self.params.max_count_uncalibrated);
        let search = &self.params.reference;
        let mut circles = find_circles_with(
            edges,
            search.radius_min,
            search.radius_max,
            &params,
            self.params.mode,
        )?;
        resolve_overlaps(&mut circles);
        Ok(circles.iter().map(|c| self.to_color_frame(c)).collect())
    }

    /// Detect and value every coin in a frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, edges, color), fields(width = edges.width, height = edges.height))
    )]
    pub fn detect_coins(
        &self,
        edges: &GrayImageView<'_>,
        color: &RgbImageView<'_>,
    ) -> Result<CoinReport, CoinDetectError> {
        let calibration = self
            .calibration
            .as_ref()
            .ok_or(CoinDetectError::NotCalibrated)?;

        let mut circles = find_circles_with(
            edges,
            calibration.radius_min_px(),
            calibration.radius_max_px(),
            &self.params.hough,
            self.params.mode,
        )?;
        resolve_overlaps(&mut circles);

        let coins: Vec<DetectedCoin> = circles
            .iter()
            .map(|c| self.value_circle(calibration, color, &self.to_color_frame(c)))
            .collect();
        for (i, coin) in coins.iter().enumerate() {
            debug!("circle #{i} {coin}");
        }

        let report = CoinReport { coins };
        info!(
            "{} coin(s), total {} EUR",
            report.recognized(),
            report.total()
        );
        Ok(report)
    }

    /// Value one circle given in color-image coordinates.
    pub fn value_circle(
        &self,
        calibration: &Calibration,
        color: &RgbImageView<'_>,
        circle: &CircleItem,
    ) -> DetectedCoin {
        let off_frame = DetectedCoin {
            circle: *circle,
            outcome: CoinOutcome::OffFrame,
            sample: None,
        };
        if is_off_frame(color.width, color.height, circle.x, circle.y, circle.r) {
            return off_frame;
        }

        let sample = match sample_coin_colors(color, circle.x, circle.y, circle.r) {
            Ok(sample) => sample,
            Err(SampleError::OffFrame { .. }) => return off_frame,
            Err(e) => {
                debug!("circle {circle} not sampled: {e}");
                return DetectedCoin {
                    circle: *circle,
                    outcome: CoinOutcome::Unrecognized { colors: None },
                    sample: None,
                };
            }
        };

        let verdict = calibration.classify(circle.r, &sample, &self.params.colors);
        let outcome = match verdict.coin {
            Some(coin) => CoinOutcome::Recognized {
                value: coin.denomination.value,
                colors: verdict.colors,
            },
            None => CoinOutcome::Unrecognized {
                colors: Some(verdict.colors),
            },
        };
        DetectedCoin {
            circle: *circle,
            outcome,
            sample: Some(sample),
        }
    }
}
