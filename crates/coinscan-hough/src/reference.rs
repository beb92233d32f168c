use coinscan_core::{CircleItem, GrayImageView};
use log::{debug, info};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::validate_radius_range;
use crate::peaks::extract_peak;
use crate::{Accumulator, AngleTable, HoughError, HoughParams, ReferenceSearchParams};

/// Find the single strongest circle in the reference radius range.
///
/// One peak is taken per radius; the first radius reaching the highest vote
/// wins. The result must clear every image border by `r + frame_margin_px`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(edges, search, params), fields(width = edges.width, height = edges.height))
)]
pub fn find_reference_circle(
    edges: &GrayImageView<'_>,
    search: &ReferenceSearchParams,
    params: &HoughParams,
) -> Result<CircleItem, HoughError> {
    params.validate()?;
    validate_radius_range(search.radius_min, search.radius_max)?;
    let angles = AngleTable::new(params.phi_step_deg)?;

    let mut best: Option<CircleItem> = None;
    for r in search.radius_min..=search.radius_max {
        let mut acc = Accumulator::from_edges(edges, r, params.cell_step, &angles)?;
        let Some(peak) = extract_peak(&mut acc) else {
            continue;
        };
        let votes = i32::try_from(peak.votes).unwrap_or(i32::MAX);
        debug!("reference sweep r={r}: ({}, {}) v={votes}", peak.x, peak.y);
        if best.map_or(true, |b| votes > b.v) {
            best = Some(CircleItem::new(peak.x, peak.y, r, votes));
        }
    }

    let circle = best.ok_or(HoughError::ReferenceNotFound {
        min: search.radius_min,
        max: search.radius_max,
    })?;

    let clearance = circle.r + search.frame_margin_px;
    let (w, h) = (edges.width as i32, edges.height as i32);
    if circle.x < clearance
        || circle.y < clearance
        || circle.x > w - clearance
        || circle.y > h - clearance
    {
        return Err(HoughError::ReferenceOffFrame {
            x: circle.x,
            y: circle.y,
            r: circle.r,
        });
    }
    info!("reference circle: {circle}");
    Ok(circle)
}
