use crate::Cents;

/// Errors returned while deriving a calibration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("reference coin {value} EUR is not in the catalog")]
    UnknownReference { value: Cents },
    #[error("invalid calibrated radius bounds [{min}, {max}] px")]
    InvalidBounds { min: i32, max: i32 },
    #[error("coin catalog is empty")]
    EmptyCatalog,
    #[error("radius tolerance must be non-negative (got {0})")]
    InvalidTolerance(i32),
}

/// Reasons a circle could not be color-sampled.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("circle (x={x}, y={y}, r={r}) is not fully inside the color image")]
    OffFrame { x: i32, y: i32, r: i32 },
    #[error("circle radius must be positive (got {0})")]
    InvalidRadius(i32),
    #[error("sampled region is completely dark")]
    Dark,
}
