//! Euro coin catalog and value classification.
//!
//! A reference coin of known value fixes the pixel scale
//! ([`CoinCatalog::calibrate`]). Each detected circle is then sampled for the
//! chromaticity of its ring and core ([`sample_coin_colors`]), the samples are
//! named ([`classify_color`]) and matched by radius and colors
//! ([`Calibration::lookup`]).

mod calibration;
mod catalog;
mod color;
mod error;
mod money;

pub use calibration::{CalibratedCoin, Calibration, Classification, ColorNames};
pub use catalog::{CoinCatalog, CoinColor, Denomination, EURO_COINS};
pub use color::{
    classify_color, is_off_frame, sample_coin_colors, Chromaticity, ColorSample, ColorThresholds,
    WhiteBalance, CORE_RADIUS_FRACTION, RING_RADIUS_FRACTION, STROKE_FRACTION,
};
pub use error::{CalibrationError, SampleError};
pub use money::Cents;
