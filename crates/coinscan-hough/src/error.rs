/// Errors returned by the circle detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HoughError {
    #[error("accumulator cell step must be positive and finite (got {0})")]
    InvalidCellStep(f32),
    #[error("angular step must be positive and finite degrees (got {0})")]
    InvalidPhiStep(f32),
    #[error("invalid radius range [{min}, {max}]")]
    InvalidRadiusRange { min: i32, max: i32 },
    #[error("accumulator for r={radius} at cell step {cell_step} exceeds {limit} cells")]
    AccumulatorTooLarge {
        radius: i32,
        cell_step: f32,
        limit: usize,
    },
    #[error("max peaks per radius must be at least 1")]
    InvalidMaxCount,
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
    #[error("no reference circle found for radii [{min}, {max}]")]
    ReferenceNotFound { min: i32, max: i32 },
    #[error("reference circle (x={x}, y={y}, r={r}) is too close to the image border")]
    ReferenceOffFrame { x: i32, y: i32, r: i32 },
}
