use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    classify_color, CalibrationError, Cents, CoinColor, ColorSample, ColorThresholds,
    Denomination, WhiteBalance,
};

/// A catalog entry with its radius in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibratedCoin {
    pub denomination: Denomination,
    pub radius_px: i32,
}

/// Ring and core color names of one sampled coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorNames {
    pub ring: CoinColor,
    pub core: CoinColor,
}

/// Outcome of matching one detected circle against the calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub colors: ColorNames,
    pub coin: Option<CalibratedCoin>,
}

/// Immutable result of one calibration event.
///
/// Coins are kept sorted by `radius_px`; lookups rely on that order to stop
/// early. A new reference measurement produces a new value instead of
/// mutating this one. Deserialization recomputes the bounds from the coins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredCalibration")]
pub struct Calibration {
    coins: Vec<CalibratedCoin>,
    radius_min_px: i32,
    radius_max_px: i32,
    tolerance_px: i32,
    reference_colors: Option<ColorSample>,
    white_balance: Option<WhiteBalance>,
}

#[derive(Deserialize)]
struct StoredCalibration {
    coins: Vec<CalibratedCoin>,
    tolerance_px: i32,
    #[serde(default)]
    reference_colors: Option<ColorSample>,
    #[serde(default)]
    white_balance: Option<WhiteBalance>,
}

impl TryFrom<StoredCalibration> for Calibration {
    type Error = CalibrationError;

    fn try_from(stored: StoredCalibration) -> Result<Self, Self::Error> {
        let mut cal = Calibration::from_coins(stored.coins, stored.tolerance_px)?;
        cal.reference_colors = stored.reference_colors;
        cal.white_balance = stored.white_balance;
        Ok(cal)
    }
}

impl Calibration {
    pub fn from_coins(
        mut coins: Vec<CalibratedCoin>,
        tolerance_px: i32,
    ) -> Result<Self, CalibrationError> {
        if tolerance_px < 0 {
            return Err(CalibrationError::InvalidTolerance(tolerance_px));
        }
        coins.sort_by_key(|c| c.radius_px);
        let (Some(first), Some(last)) = (coins.first(), coins.last()) else {
            return Err(CalibrationError::EmptyCatalog);
        };

        let min = first.radius_px - tolerance_px;
        let max = last.radius_px + tolerance_px;
        if min <= 0 || max <= min {
            return Err(CalibrationError::InvalidBounds { min, max });
        }

        Ok(Self {
            coins,
            radius_min_px: min,
            radius_max_px: max,
            tolerance_px,
            reference_colors: None,
            white_balance: None,
        })
    }

    pub fn coins(&self) -> &[CalibratedCoin] {
        &self.coins
    }

    /// Smallest radius swept in calibrated detection.
    pub fn radius_min_px(&self) -> i32 {
        self.radius_min_px
    }

    /// Largest radius swept in calibrated detection.
    pub fn radius_max_px(&self) -> i32 {
        self.radius_max_px
    }

    pub fn tolerance_px(&self) -> i32 {
        self.tolerance_px
    }

    pub fn reference_colors(&self) -> Option<&ColorSample> {
        self.reference_colors.as_ref()
    }

    pub fn white_balance(&self) -> Option<&WhiteBalance> {
        self.white_balance.as_ref()
    }

    /// Attach the reference coin's color sample.
    ///
    /// When the reference denomination has a silver part, that part becomes
    /// the neutral for white balance.
    pub fn with_reference_colors(mut self, reference_value: Cents, sample: ColorSample) -> Self {
        let neutral = self
            .coins
            .iter()
            .find(|c| c.denomination.value == reference_value)
            .and_then(|c| {
                if c.denomination.core == CoinColor::Silver {
                    Some(sample.core)
                } else if c.denomination.ring == CoinColor::Silver {
                    Some(sample.ring)
                } else {
                    None
                }
            });

        self.white_balance = match neutral {
            Some(n) => {
                let wb = WhiteBalance::from_neutral(&n);
                if wb.is_none() {
                    warn!("no white balance: reference silver has an empty channel");
                }
                wb
            }
            None => {
                debug!("reference coin {reference_value} EUR has no silver part");
                None
            }
        };
        self.reference_colors = Some(sample);
        self
    }

    /// Drop the white balance; colors are then named from raw samples.
    pub fn without_white_balance(mut self) -> Self {
        self.white_balance = None;
        self
    }

    /// Best catalog match for a radius and color pair.
    ///
    /// Candidates must lie within `tolerance_px` and match both colors; the
    /// smallest radius difference wins, first in radius order on ties.
    pub fn lookup(&self, radius: i32, ring: CoinColor, core: CoinColor) -> Option<&CalibratedCoin> {
        let lo = radius - self.tolerance_px;
        let hi = radius + self.tolerance_px;
        let mut best: Option<(&CalibratedCoin, i32)> = None;

        for coin in &self.coins {
            if coin.radius_px > hi {
                break;
            }
            if coin.radius_px < lo
                || coin.denomination.ring != ring
                || coin.denomination.core != core
            {
                continue;
            }
            let diff = (radius - coin.radius_px).abs();
            if best.is_none_or(|(_, d)| diff < d) {
                best = Some((coin, diff));
            }
        }
        best.map(|(coin, _)| coin)
    }

    /// Name the sample colors, white-balanced when available.
    pub fn color_names(&self, sample: &ColorSample, thresholds: &ColorThresholds) -> ColorNames {
        let sample = match &self.white_balance {
            Some(wb) => sample.balanced(wb),
            None => *sample,
        };
        ColorNames {
            ring: classify_color(&sample.ring, thresholds),
            core: classify_color(&sample.core, thresholds),
        }
    }

    pub fn classify(
        &self,
        radius: i32,
        sample: &ColorSample,
        thresholds: &ColorThresholds,
    ) -> Classification {
        let colors = self.color_names(sample, thresholds);
        Classification {
            colors,
            coin: self.lookup(radius, colors.ring, colors.core).copied(),
        }
    }
}
