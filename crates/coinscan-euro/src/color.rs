use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use coinscan_core::RgbImageView;

use crate::{CoinColor, SampleError};

/// Fraction of the coin radius where the outer ring stroke is centered.
pub const RING_RADIUS_FRACTION: f32 = 0.86;
/// Fraction of the coin radius where the core stroke is centered.
pub const CORE_RADIUS_FRACTION: f32 = 0.36;
/// Stroke thickness as a fraction of the coin radius (at least one pixel).
pub const STROKE_FRACTION: f32 = 0.05;

/// RGB channel balance normalized to sum to one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chromaticity(pub Vector3<f32>);

impl Chromaticity {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self(Vector3::new(r, g, b))
    }

    /// Normalize raw channel sums. `None` when all channels are zero.
    pub fn from_sums(sums: [u64; 3]) -> Option<Self> {
        let total = sums.iter().sum::<u64>();
        if total == 0 {
            return None;
        }
        let total = total as f64;
        Some(Self::new(
            (sums[0] as f64 / total) as f32,
            (sums[1] as f64 / total) as f32,
            (sums[2] as f64 / total) as f32,
        ))
    }

    #[inline]
    pub fn r(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn g(&self) -> f32 {
        self.0.y
    }

    #[inline]
    pub fn b(&self) -> f32 {
        self.0.z
    }

    /// Rescale so the channels sum to one again.
    fn renormalized(v: Vector3<f32>) -> Self {
        let total = v.sum();
        if total > 0.0 {
            Self(v / total)
        } else {
            Self(v)
        }
    }
}

/// Chromaticity of the outer ring and the inner core of one coin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub ring: Chromaticity,
    pub core: Chromaticity,
}

impl ColorSample {
    pub fn balanced(&self, wb: &WhiteBalance) -> Self {
        Self {
            ring: wb.apply(&self.ring),
            core: wb.apply(&self.core),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Ring,
    Core,
}

/// Two circular strokes inside the `2r x 2r` box around a coin.
#[derive(Clone, Copy, Debug)]
struct StrokeMasks {
    center: f32,
    half_thickness: f32,
    ring_radius: f32,
    core_radius: f32,
}

impl StrokeMasks {
    fn for_radius(r: i32) -> Self {
        let rf = r as f32;
        let thickness = (STROKE_FRACTION * rf).round().max(1.0);
        Self {
            center: rf,
            half_thickness: 0.5 * thickness,
            ring_radius: RING_RADIUS_FRACTION * rf,
            core_radius: CORE_RADIUS_FRACTION * rf,
        }
    }

    /// Core membership wins where both strokes cover a pixel.
    fn region(&self, col: i32, row: i32) -> Option<Region> {
        let dx = col as f32 - self.center;
        let dy = row as f32 - self.center;
        let d = (dx * dx + dy * dy).sqrt();
        if (d - self.core_radius).abs() <= self.half_thickness {
            Some(Region::Core)
        } else if (d - self.ring_radius).abs() <= self.half_thickness {
            Some(Region::Ring)
        } else {
            None
        }
    }
}

/// `true` when the `2r x 2r` box around the circle leaves the image.
pub fn is_off_frame(width: usize, height: usize, x: i32, y: i32, r: i32) -> bool {
    let (x, y, r) = (i64::from(x), i64::from(y), i64::from(r));
    x < r || y < r || x + r > width as i64 || y + r > height as i64
}

/// Sample ring and core chromaticity of the coin centered at `(cx, cy)`.
#[cfg_attr(feature = "tracing", instrument(level = "trace", skip(image)))]
pub fn sample_coin_colors(
    image: &RgbImageView<'_>,
    cx: i32,
    cy: i32,
    r: i32,
) -> Result<ColorSample, SampleError> {
    if r < 1 {
        return Err(SampleError::InvalidRadius(r));
    }
    let off_frame = SampleError::OffFrame { x: cx, y: cy, r };
    if is_off_frame(image.width, image.height, cx, cy, r) {
        return Err(off_frame);
    }

    let masks = StrokeMasks::for_radius(r);
    let mut ring = [0u64; 3];
    let mut core = [0u64; 3];
    let (x0, y0) = (cx - r, cy - r);
    let side = 2 * r;

    for row in 0..side {
        for col in 0..side {
            let Some(region) = masks.region(col, row) else {
                continue;
            };
            let px = image.pixel(x0 + col, y0 + row).ok_or(off_frame)?;
            let acc = match region {
                Region::Core => &mut core,
                Region::Ring => &mut ring,
            };
            for (sum, &v) in acc.iter_mut().zip(px.iter()) {
                *sum += u64::from(v);
            }
        }
    }

    Ok(ColorSample {
        ring: Chromaticity::from_sums(ring).ok_or(SampleError::Dark)?,
        core: Chromaticity::from_sums(core).ok_or(SampleError::Dark)?,
    })
}

/// Thresholds separating silver from colored metal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Every channel must be above this for silver.
    pub silver_min: f32,
    /// Every channel must be below this for silver.
    pub silver_max: f32,
    /// Blue share below this is not a metal color.
    pub min_blue: f32,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            silver_min: 0.31,
            silver_max: 0.35,
            min_blue: 0.05,
        }
    }
}

impl ColorThresholds {
    /// Wider silver band for footage with strong contrast and saturated highlights.
    pub fn high_contrast() -> Self {
        Self {
            silver_min: 0.29,
            silver_max: 0.37,
            ..Self::default()
        }
    }
}

/// Name the metal color of a chromaticity sample.
pub fn classify_color(c: &Chromaticity, thresholds: &ColorThresholds) -> CoinColor {
    let (r, g, b) = (c.r(), c.g(), c.b());
    let max = c.0.max();
    let min = c.0.min();

    if min > thresholds.silver_min && max < thresholds.silver_max {
        return CoinColor::Silver;
    }
    if g < b || r < g || b < thresholds.min_blue {
        return CoinColor::Unknown;
    }
    if r - g > g - b {
        CoinColor::Bronze
    } else {
        CoinColor::Gold
    }
}

/// Per-channel gains mapping a known neutral sample to equal channel shares.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhiteBalance {
    pub gains: Vector3<f32>,
}

impl WhiteBalance {
    /// `None` if any channel of the neutral sample is empty.
    pub fn from_neutral(neutral: &Chromaticity) -> Option<Self> {
        if neutral.0.iter().any(|&v| v <= 0.0 || !v.is_finite()) {
            return None;
        }
        Some(Self {
            gains: neutral.0.map(|v| (1.0 / 3.0) / v),
        })
    }

    pub fn apply(&self, c: &Chromaticity) -> Chromaticity {
        Chromaticity::renormalized(c.0.component_mul(&self.gains))
    }
}
