//! High-level facade crate for the `coinscan-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates
//! - [`CoinDetector`], which calibrates on a reference coin and values every
//!   coin found in later frames
//! - JSON config/report helpers and (feature `image`) adapters from
//!   `image::GrayImage` / `image::RgbImage`.
//!
//! ## Quickstart
//!
//! ```no_run
//! use coinscan::image_io::{gray_view, load_color_image, load_edge_image, rgb_view};
//! use coinscan::{CoinDetector, CoinDetectorParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let edges = load_edge_image("edges.png")?;
//! let frame = load_color_image("frame.png")?;
//!
//! let mut detector = CoinDetector::new(CoinDetectorParams::default());
//! detector.calibrate_from_frame(&gray_view(&edges), &rgb_view(&frame))?;
//!
//! let report = detector.detect_coins(&gray_view(&edges), &rgb_view(&frame))?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `coinscan::core`: image buffers, `CircleItem`, logger setup.
//! - `coinscan::hough`: circle Hough sweep, aggregation, overlap resolution.
//! - `coinscan::euro`: coin catalog, calibration, color sampling.
//! - `coinscan::image_io` (feature `image`): adapters and loaders.

pub use coinscan_core as core;
pub use coinscan_euro as euro;
pub use coinscan_hough as hough;

pub use coinscan_core::CircleItem;
pub use coinscan_euro::{Calibration, Cents, CoinColor};
pub use coinscan_hough::{HoughParams, SearchMode};

mod detector;
pub mod io;

#[cfg(feature = "image")]
pub mod image_io;

pub use detector::{
    CoinDetectError, CoinDetector, CoinDetectorParams, CoinOutcome, CoinReport, DetectedCoin,
};
pub use io::{CoinDetectConfig, CoinDetectReport, CoinIoError};
