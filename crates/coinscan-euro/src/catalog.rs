use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CalibratedCoin, Calibration, CalibrationError, Cents};

/// Named metal color of a coin ring or core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinColor {
    Bronze,
    Silver,
    Gold,
    Unknown,
}

impl fmt::Display for CoinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoinColor::Bronze => "bronze",
            CoinColor::Silver => "silver",
            CoinColor::Gold => "gold",
            CoinColor::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Physical description of one coin type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Denomination {
    pub value: Cents,
    pub diameter_mm: f32,
    pub ring: CoinColor,
    pub core: CoinColor,
}

impl Denomination {
    pub const fn new(value: u32, diameter_mm: f32, ring: CoinColor, core: CoinColor) -> Self {
        Self {
            value: Cents(value),
            diameter_mm,
            ring,
            core,
        }
    }

    #[inline]
    pub fn radius_mm(&self) -> f32 {
        0.5 * self.diameter_mm
    }
}

/// The eight euro coins, ascending by diameter.
pub const EURO_COINS: [Denomination; 8] = [
    Denomination::new(1, 16.25, CoinColor::Bronze, CoinColor::Bronze),
    Denomination::new(2, 18.75, CoinColor::Bronze, CoinColor::Bronze),
    Denomination::new(10, 19.75, CoinColor::Gold, CoinColor::Gold),
    Denomination::new(5, 21.25, CoinColor::Bronze, CoinColor::Bronze),
    Denomination::new(20, 22.25, CoinColor::Gold, CoinColor::Gold),
    Denomination::new(100, 23.25, CoinColor::Gold, CoinColor::Silver),
    Denomination::new(50, 24.25, CoinColor::Gold, CoinColor::Gold),
    Denomination::new(200, 25.75, CoinColor::Silver, CoinColor::Gold),
];

/// Static table of recognizable coins, sorted ascending by diameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinCatalog {
    coins: Vec<Denomination>,
}

impl Default for CoinCatalog {
    fn default() -> Self {
        Self::euro()
    }
}

impl CoinCatalog {
    pub fn euro() -> Self {
        Self {
            coins: EURO_COINS.to_vec(),
        }
    }

    /// Custom catalog; entries are sorted by diameter.
    pub fn from_denominations(mut coins: Vec<Denomination>) -> Self {
        coins.sort_by(|a, b| a.diameter_mm.total_cmp(&b.diameter_mm));
        Self { coins }
    }

    pub fn coins(&self) -> &[Denomination] {
        &self.coins
    }

    pub fn find(&self, value: Cents) -> Option<&Denomination> {
        self.coins.iter().find(|c| c.value == value)
    }

    /// Derive per-coin pixel radii from one measured reference coin.
    ///
    /// Every radius is `round(reference_radius_px * radius_mm / reference_radius_mm)`.
    /// The search bounds are the extreme radii padded by `tolerance_px`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn calibrate(
        &self,
        reference_value: Cents,
        reference_radius_px: i32,
        tolerance_px: i32,
    ) -> Result<Calibration, CalibrationError> {
        let reference = self
            .find(reference_value)
            .ok_or(CalibrationError::UnknownReference {
                value: reference_value,
            })?;
        let scale = f64::from(reference_radius_px) / f64::from(reference.radius_mm());

        let coins: Vec<CalibratedCoin> = self
            .coins
            .iter()
            .map(|&denomination| CalibratedCoin {
                denomination,
                radius_px: (scale * f64::from(denomination.radius_mm())).round() as i32,
            })
            .collect();

        let calibration = Calibration::from_coins(coins, tolerance_px)?;
        for coin in calibration.coins() {
            info!(
                "coin {} EUR: radius {} px",
                coin.denomination.value, coin.radius_px
            );
        }
        info!(
            "calibrated search radius: {}..{} px",
            calibration.radius_min_px(),
            calibration.radius_max_px()
        );
        Ok(calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euro_table_is_sorted_and_complete() {
        let catalog = CoinCatalog::euro();
        assert_eq!(catalog.coins().len(), 8);
        assert!(catalog
            .coins()
            .windows(2)
            .all(|w| w[0].diameter_mm < w[1].diameter_mm));
        let bimetal: Vec<u32> = catalog
            .coins()
            .iter()
            .filter(|c| c.ring != c.core)
            .map(|c| c.value.0)
            .collect();
        assert_eq!(bimetal, vec![100, 200]);
    }

    #[test]
    fn calibrate_from_one_euro_at_100px() {
        let cal = CoinCatalog::euro().calibrate(Cents(100), 100, 2).unwrap();
        let radii: Vec<(u32, i32)> = cal
            .coins()
            .iter()
            .map(|c| (c.denomination.value.0, c.radius_px))
            .collect();
        assert_eq!(
            radii,
            vec![
                (1, 70),
                (2, 81),
                (10, 85),
                (5, 91),
                (20, 96),
                (100, 100),
                (50, 104),
                (200, 111)
            ]
        );
        assert_eq!(cal.radius_min_px(), 68);
        assert_eq!(cal.radius_max_px(), 113);
    }

    #[test]
    fn calibrated_radii_follow_diameter_order() {
        let catalog = CoinCatalog::euro();
        let cal = catalog.calibrate(Cents(100), 100, 2).unwrap();
        let mut by_diameter = cal.coins().to_vec();
        let diameter = |c: &CalibratedCoin| c.denomination.diameter_mm;
        by_diameter.sort_by(|a, b| diameter(a).total_cmp(&diameter(b)));
        assert!(by_diameter
            .windows(2)
            .all(|w| w[0].radius_px <= w[1].radius_px));
        assert!(cal.radius_min_px() < cal.radius_max_px());
    }

    #[test]
    fn custom_catalog_is_sorted_by_diameter() {
        let catalog = CoinCatalog::from_denominations(vec![EURO_COINS[7], EURO_COINS[0]]);
        let values: Vec<u32> = catalog.coins().iter().map(|c| c.value.0).collect();
        assert_eq!(values, vec![1, 200]);
        assert!(catalog.find(Cents(100)).is_none());

        let cal = catalog.calibrate(Cents(200), 103, 1).unwrap();
        assert_eq!(cal.coins()[0].radius_px, 65);
        assert_eq!((cal.radius_min_px(), cal.radius_max_px()), (64, 104));
    }

    #[test]
    fn unknown_reference_is_recoverable() {
        let err = CoinCatalog::euro().calibrate(Cents(300), 100, 2).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::UnknownReference { value: Cents(300) }
        );
    }

    #[test]
    fn degenerate_reference_radius_is_rejected() {
        let err = CoinCatalog::euro().calibrate(Cents(100), 0, 2).unwrap_err();
        assert!(
            matches!(err, CalibrationError::InvalidBounds { .. }),
            "{err}"
        );
    }

    #[test]
    fn color_names() {
        assert_eq!(CoinColor::Gold.to_string(), "gold");
        assert_eq!(CoinColor::Unknown.to_string(), "unknown");
    }
}
