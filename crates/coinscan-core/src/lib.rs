//! Core types for coin detection.
//!
//! This crate is intentionally small: borrowed and owned pixel buffers, the
//! `CircleItem` record shared by the detector crates, and logger setup. It
//! does *not* depend on any concrete image library.

mod circle;
mod image;
mod logger;

pub use circle::CircleItem;
pub use image::{GrayImage, GrayImageView, ImageError, RgbImage, RgbImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
