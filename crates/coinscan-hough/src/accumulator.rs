//! Per-radius circle Hough accumulator.
//!
//! Every edge pixel `(x, y)` votes for all centers `(x - r cos phi, y - r sin phi)`
//! on a circle of radius `r` around it. Centers are binned into square cells
//! of `cell_step` pixels and shifted by `round(r / cell_step)` cells so that
//! centers up to `r` pixels outside the image are still representable.

use coinscan_core::GrayImageView;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{HoughError, HoughParams};

/// Upper bound on the cells of one accumulator grid (1 GiB of votes).
pub const MAX_ACCUMULATOR_CELLS: usize = 1 << 28;

/// Precomputed `(cos phi, sin phi)` for `phi` in `[0, 360)` degrees.
#[derive(Clone, Debug)]
pub struct AngleTable {
    dirs: Vec<(f32, f32)>,
}

impl AngleTable {
    pub fn new(phi_step_deg: f32) -> Result<Self, HoughError> {
        if !phi_step_deg.is_finite() || phi_step_deg <= 0.0 {
            return Err(HoughError::InvalidPhiStep(phi_step_deg));
        }
        let step = f64::from(phi_step_deg);
        let dirs = (0u32..)
            .map(|k| f64::from(k) * step)
            .take_while(|&deg| deg < 360.0)
            .map(|deg| {
                let (sin_t, cos_t) = deg.to_radians().sin_cos();
                (cos_t as f32, sin_t as f32)
            })
            .collect();
        Ok(Self { dirs })
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.dirs.iter().copied()
    }
}

/// Vote grid for one candidate radius, row-major `height x width` cells.
#[derive(Clone, Debug)]
pub struct Accumulator {
    width: usize,
    height: usize,
    votes: Vec<u32>,
    radius: i32,
    cell_step: f32,
    shift: i32,
}

impl Accumulator {
    /// Empty accumulator covering centers in `[-r, cols - 1 + r] x [-r, rows - 1 + r]`.
    ///
    /// Fails when the grid would exceed [`MAX_ACCUMULATOR_CELLS`].
    pub fn new(
        image_width: usize,
        image_height: usize,
        radius: i32,
        cell_step: f32,
    ) -> Result<Self, HoughError> {
        if !cell_step.is_finite() || cell_step <= 0.0 {
            return Err(HoughError::InvalidCellStep(cell_step));
        }
        let span = 2.0 * f64::from(radius);
        let step = f64::from(cell_step);
        let cells = |side: usize| ((side as f64 + span) / step).ceil();
        let (w, h) = (cells(image_width), cells(image_height));
        let too_large = HoughError::AccumulatorTooLarge {
            radius,
            cell_step,
            limit: MAX_ACCUMULATOR_CELLS,
        };
        if w * h > MAX_ACCUMULATOR_CELLS as f64 {
            return Err(too_large);
        }
        let (width, height) = (w as usize, h as usize);
        let len = width
            .checked_mul(height)
            .filter(|&n| n <= MAX_ACCUMULATOR_CELLS)
            .ok_or(too_large)?;
        Ok(Self {
            width,
            height,
            votes: vec![0; len],
            radius,
            cell_step,
            shift: (radius as f32 / cell_step).round() as i32,
        })
    }

    /// Vote accumulation for every edge pixel of `edges`.
    pub fn from_edges(
        edges: &GrayImageView<'_>,
        radius: i32,
        cell_step: f32,
        angles: &AngleTable,
    ) -> Result<Self, HoughError> {
        let mut acc = Self::new(edges.width, edges.height, radius, cell_step)?;
        let r = radius as f32;
        for (x, y) in edges.edge_pixels() {
            let (x, y) = (x as f32, y as f32);
            for (cos_t, sin_t) in angles.iter() {
                acc.vote(x - r * cos_t, y - r * sin_t);
            }
        }
        Ok(acc)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    #[inline]
    pub fn cell_step(&self) -> f32 {
        self.cell_step
    }

    /// Cell index of a pixel-space center, if it falls inside the grid.
    #[inline]
    pub fn cell_of(&self, a: f32, b: f32) -> Option<(usize, usize)> {
        let ax = (a / self.cell_step).round() as i32 + self.shift;
        let ay = (b / self.cell_step).round() as i32 + self.shift;
        if ax < 0 || ay < 0 || ax as usize >= self.width || ay as usize >= self.height {
            return None;
        }
        Some((ax as usize, ay as usize))
    }

    /// Add one vote for the pixel-space center `(a, b)`. Returns `false` when
    /// the center falls outside the grid.
    #[inline]
    pub fn vote(&mut self, a: f32, b: f32) -> bool {
        match self.cell_of(a, b) {
            Some((ax, ay)) => {
                self.votes[ay * self.width + ax] += 1;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, ax: usize, ay: usize) -> Option<u32> {
        if ax >= self.width || ay >= self.height {
            return None;
        }
        Some(self.votes[ay * self.width + ax])
    }

    pub fn total_votes(&self) -> u64 {
        self.votes.iter().map(|&v| u64::from(v)).sum()
    }

    /// Strongest cell; ties resolve to the first cell in row-major order.
    pub fn max_cell(&self) -> Option<(usize, usize, u32)> {
        let mut best: Option<(usize, u32)> = None;
        for (idx, &v) in self.votes.iter().enumerate() {
            if best.map_or(true, |(_, bv)| v > bv) {
                best = Some((idx, v));
            }
        }
        best.map(|(idx, v)| (idx % self.width, idx / self.width, v))
    }

    /// Zero every cell within `radius_cells` (Euclidean) of `(cx, cy)`.
    pub fn suppress_disk(&mut self, cx: usize, cy: usize, radius_cells: i32) {
        let r2 = radius_cells * radius_cells;
        let (cx, cy) = (cx as i32, cy as i32);
        let y0 = (cy - radius_cells).max(0);
        let y1 = (cy + radius_cells).min(self.height as i32 - 1);
        let x0 = (cx - radius_cells).max(0);
        let x1 = (cx + radius_cells).min(self.width as i32 - 1);
        for y in y0..=y1 {
            let dy = y - cy;
            for x in x0..=x1 {
                let dx = x - cx;
                if dx * dx + dy * dy <= r2 {
                    self.votes[y as usize * self.width + x as usize] = 0;
                }
            }
        }
    }

    /// Map a cell back to image pixel coordinates: `round(cell * step - r)`.
    #[inline]
    pub fn cell_to_pixel(&self, ax: usize, ay: usize) -> (i32, i32) {
        let r = self.radius as f32;
        (
            (ax as f32 * self.cell_step - r).round() as i32,
            (ay as f32 * self.cell_step - r).round() as i32,
        )
    }
}

/// Build the accumulator of `edges` for one radius.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn build_accumulator(
    edges: &GrayImageView<'_>,
    radius: i32,
    params: &HoughParams,
) -> Result<Accumulator, HoughError> {
    params.validate()?;
    crate::params::validate_radius_range(radius, radius)?;
    let angles = AngleTable::new(params.phi_step_deg)?;
    Accumulator::from_edges(edges, radius, params.cell_step, &angles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinscan_core::GrayImage;

    #[test]
    fn angle_table_covers_full_turn_without_wrapping() {
        assert_eq!(AngleTable::new(1.0).unwrap().len(), 360);
        assert_eq!(AngleTable::new(7.0).unwrap().len(), 52);
        assert_eq!(AngleTable::new(400.0).unwrap().len(), 1);
        assert!(AngleTable::new(0.0).is_err());
    }

    #[test]
    fn dimensions_cover_centers_outside_the_image() {
        let acc = Accumulator::new(100, 50, 10, 1.0).unwrap();
        assert_eq!((acc.width(), acc.height()), (120, 70));
        assert_eq!(acc.cell_of(-10.0, -10.0), Some((0, 0)));
        assert_eq!(acc.cell_of(109.0, 59.0), Some((119, 69)));
        assert_eq!(acc.cell_of(110.0, 0.0), None);

        let coarse = Accumulator::new(100, 50, 10, 2.0).unwrap();
        assert_eq!((coarse.width(), coarse.height()), (60, 35));
        assert_eq!(coarse.cell_to_pixel(5, 5), (0, 0));
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let err = Accumulator::new(640, 480, 30, 1e-6).unwrap_err();
        assert!(
            matches!(err, HoughError::AccumulatorTooLarge { radius: 30, .. }),
            "{err}"
        );
        assert!(Accumulator::new(640, 480, 30, 0.0).is_err());

        let mut img = GrayImage::new(64, 64);
        img.put(32, 32, 255);
        let params = HoughParams {
            cell_step: 1e-6,
            ..HoughParams::default()
        };
        assert!(build_accumulator(&img.view(), 10, &params).is_err());
    }

    #[test]
    fn single_pixel_votes_once_per_angle() {
        let mut img = GrayImage::new(40, 40);
        img.put(20, 20, 255);
        let params = HoughParams {
            phi_step_deg: 90.0,
            ..HoughParams::default()
        };
        let acc = build_accumulator(&img.view(), 5, &params).unwrap();
        assert_eq!(acc.total_votes(), 4);
        // phi = 0 votes for (x - r, y)
        let (ax, ay) = acc.cell_of(15.0, 20.0).unwrap();
        assert_eq!(acc.get(ax, ay), Some(1));
    }

    #[test]
    fn max_cell_prefers_first_in_row_major_order() {
        let mut acc = Accumulator::new(10, 10, 1, 1.0).unwrap();
        acc.vote(3.0, 2.0);
        acc.vote(1.0, 4.0);
        let (ax, ay, v) = acc.max_cell().unwrap();
        assert_eq!(v, 1);
        assert_eq!(acc.cell_to_pixel(ax, ay), (3, 2));
    }

    #[test]
    fn suppress_disk_clears_only_the_disk() {
        let mut acc = Accumulator::new(30, 30, 1, 1.0).unwrap();
        for (a, b) in [(10.0, 10.0), (13.0, 14.0), (14.0, 14.0), (0.0, 0.0)] {
            acc.vote(a, b);
        }
        let (cx, cy) = acc.cell_of(10.0, 10.0).unwrap();
        acc.suppress_disk(cx, cy, 5);
        // (13, 14) is at distance 5, (14, 14) beyond it.
        assert_eq!(acc.total_votes(), 2);
        let (ax, ay) = acc.cell_of(14.0, 14.0).unwrap();
        assert_eq!(acc.get(ax, ay), Some(1));
    }
}
