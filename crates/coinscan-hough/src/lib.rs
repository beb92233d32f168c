//! Circle detection on binary edge maps with a per-radius Hough transform.
//!
//! Pipeline:
//! 1. For each radius `r` in the search range, every edge pixel votes for all
//!    centers at distance `r` ([`Accumulator`]).
//! 2. Peaks are pulled out of the accumulator strongest first, each one
//!    clearing a small disk around itself ([`extract_peak`]). A radius stops
//!    yielding peaks at the first one weaker than its strongest.
//! 3. Peaks of neighbouring radii describing the same circle are merged,
//!    keeping the strongest estimate ([`add_found_center`]).
//! 4. Overlapping survivors are resolved by vote count ([`resolve_overlaps`]).
//!
//! The sweep runs either on one thread ([`find_circles`]) or over disjoint
//! radius partitions on the rayon pool ([`find_circles_parallel`]).
//!
//! ## Quickstart
//!
//! ```
//! use coinscan_core::GrayImage;
//! use coinscan_hough::{find_circles, resolve_overlaps, HoughParams};
//!
//! let edges = GrayImage::new(64, 64);
//! let params = HoughParams::default().with_max_count(5);
//! let mut circles = find_circles(&edges.view(), 10, 12, &params).unwrap();
//! resolve_overlaps(&mut circles);
//! assert!(circles.is_empty());
//! ```

mod accumulator;
mod aggregate;
mod error;
mod overlap;
mod params;
mod peaks;
mod reference;

pub use accumulator::{build_accumulator, Accumulator, AngleTable};
pub use aggregate::{
    add_found_center, find_circles, find_circles_parallel, find_circles_with, partition_radii,
    Merge, CENTER_MATCH_PX, RADIUS_MATCH_PX,
};
pub use error::HoughError;
pub use overlap::resolve_overlaps;
pub use params::{HoughParams, ReferenceSearchParams, SearchMode};
pub use peaks::{extract_peak, radius_peaks, Peak, PEAK_SUPPRESSION_RADIUS};
pub use reference::find_reference_circle;
