use serde::{Deserialize, Serialize};

use crate::HoughError;

/// Accumulator resolution and per-radius peak budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Accumulator cell size in pixels. Larger cells are faster and coarser.
    pub cell_step: f32,
    /// Angular step of the voting sweep, in degrees.
    pub phi_step_deg: f32,
    /// Upper bound on peaks taken from one radius' accumulator.
    pub max_count_per_radius: usize,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            cell_step: 1.0,
            phi_step_deg: 1.0,
            max_count_per_radius: 20,
        }
    }
}

impl HoughParams {
    pub fn with_max_count(mut self, max_count_per_radius: usize) -> Self {
        self.max_count_per_radius = max_count_per_radius;
        self
    }

    pub fn validate(&self) -> Result<(), HoughError> {
        if !self.cell_step.is_finite() || self.cell_step <= 0.0 {
            return Err(HoughError::InvalidCellStep(self.cell_step));
        }
        if !self.phi_step_deg.is_finite() || self.phi_step_deg <= 0.0 {
            return Err(HoughError::InvalidPhiStep(self.phi_step_deg));
        }
        if self.max_count_per_radius == 0 {
            return Err(HoughError::InvalidMaxCount);
        }
        Ok(())
    }
}

/// How the radius sweep is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SearchMode {
    /// One thread, radii strictly ascending.
    Sequential,
    /// Radius range split into `workers` disjoint partitions run on the rayon pool.
    Parallel { workers: usize },
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Parallel { workers: 4 }
    }
}

/// Radius sweep used to find the calibration coin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSearchParams {
    pub radius_min: i32,
    pub radius_max: i32,
    /// Extra clearance (beyond the radius) required between the reference
    /// circle and every image border.
    pub frame_margin_px: i32,
}

impl Default for ReferenceSearchParams {
    fn default() -> Self {
        Self {
            radius_min: 15,
            radius_max: 40,
            frame_margin_px: 10,
        }
    }
}

pub(crate) fn validate_radius_range(radius_min: i32, radius_max: i32) -> Result<(), HoughError> {
    if radius_min < 1 || radius_max < radius_min {
        return Err(HoughError::InvalidRadiusRange {
            min: radius_min,
            max: radius_max,
        });
    }
    Ok(())
}
