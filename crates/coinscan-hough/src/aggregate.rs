//! Radius sweep and cross-radius deduplication of circle candidates.

use std::ops::RangeInclusive;

use coinscan_core::{CircleItem, GrayImageView};
use log::debug;
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::validate_radius_range;
use crate::peaks::radius_peaks;
use crate::{Accumulator, AngleTable, HoughError, HoughParams, SearchMode};

/// Max center offset (per axis) for two detections to be the same circle.
pub const CENTER_MATCH_PX: i32 = 10;
/// A stored circle matches a new one of radius `r` if its radius is in `[r - 5, r]`.
pub const RADIUS_MATCH_PX: i32 = 5;

/// What `add_found_center` did with a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    /// No similar circle; appended at this index.
    Inserted(usize),
    /// Replaced the weaker (or equal) similar circle at this index.
    Replaced(usize),
    /// A stronger similar circle at this index was kept.
    Discarded(usize),
}

/// Insert `found` into `list`, merging it with a similar earlier detection.
///
/// The first stored circle whose center lies within `CENTER_MATCH_PX` on both
/// axes and whose radius is in `[found.r - RADIUS_MATCH_PX, found.r]` is the
/// match. It is overwritten when `found.v >= match.v`, otherwise `found` is
/// dropped.
pub fn add_found_center(list: &mut Vec<CircleItem>, found: CircleItem) -> Merge {
    let similar = list.iter().position(|item| {
        item.r >= found.r - RADIUS_MATCH_PX
            && item.r <= found.r
            && (item.x - found.x).abs() <= CENTER_MATCH_PX
            && (item.y - found.y).abs() <= CENTER_MATCH_PX
    });
    match similar {
        Some(idx) if list[idx].v <= found.v => {
            list[idx] = found;
            Merge::Replaced(idx)
        }
        Some(idx) => Merge::Discarded(idx),
        None => {
            list.push(found);
            Merge::Inserted(list.len() - 1)
        }
    }
}

/// Ascending sweep over `radii`, appending accepted peaks into a fresh list.
fn sweep_radii(
    edges: &GrayImageView<'_>,
    radii: RangeInclusive<i32>,
    cell_step: f32,
    angles: &AngleTable,
    max_count: usize,
) -> Result<Vec<CircleItem>, HoughError> {
    let mut list = Vec::new();
    for r in radii {
        let mut acc = Accumulator::from_edges(edges, r, cell_step, angles)?;
        let peaks = radius_peaks(&mut acc, max_count);
        debug!("r={r}: {} peak(s)", peaks.len());
        for peak in peaks {
            let votes = i32::try_from(peak.votes).unwrap_or(i32::MAX);
            add_found_center(&mut list, CircleItem::new(peak.x, peak.y, r, votes));
        }
    }
    Ok(list)
}

/// Find circles with radii in `[radius_min, radius_max]`, one thread,
/// radii processed in ascending order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn find_circles(
    edges: &GrayImageView<'_>,
    radius_min: i32,
    radius_max: i32,
    params: &HoughParams,
) -> Result<Vec<CircleItem>, HoughError> {
    params.validate()?;
    validate_radius_range(radius_min, radius_max)?;
    let angles = AngleTable::new(params.phi_step_deg)?;
    let list = sweep_radii(
        edges,
        radius_min..=radius_max,
        params.cell_step,
        &angles,
        params.max_count_per_radius,
    )?;
    debug!(
        "sequential sweep [{radius_min}, {radius_max}]: {} circle(s)",
        list.len()
    );
    Ok(list)
}

/// Split `[radius_min, radius_max]` into at most `workers` contiguous,
/// disjoint, non-empty ranges of roughly equal cost.
///
/// The cost of one radius is taken proportional to the radius, so lower
/// ranges hold more radii than upper ones.
pub fn partition_radii(
    radius_min: i32,
    radius_max: i32,
    workers: usize,
) -> Vec<RangeInclusive<i32>> {
    if radius_max < radius_min || workers == 0 {
        return Vec::new();
    }
    let count = (radius_max - radius_min) as usize + 1;
    let parts = workers.min(count);
    let cost = |r: i32| r.max(1) as u64;
    let total: u64 = (radius_min..=radius_max).map(cost).sum();

    let mut out = Vec::with_capacity(parts);
    let mut start = radius_min;
    let mut acc = 0u64;
    for r in radius_min..=radius_max {
        acc += cost(r);
        let closing = out.len() + 1;
        if closing >= parts {
            break;
        }
        let radii_left = (radius_max - r) as usize;
        let parts_left = parts - closing;
        if acc * parts as u64 >= total * closing as u64 || radii_left == parts_left {
            out.push(start..=r);
            start = r + 1;
        }
    }
    out.push(start..=radius_max);
    out
}

/// Like `find_circles`, with the radius range partitioned over `workers`.
///
/// Each partition is swept independently into its own list on the rayon
/// pool; the lists are concatenated in partition order after all of them
/// finish. There is no deduplication across partitions: a circle whose
/// radius straddles a partition boundary may be reported once per side.
/// `resolve_overlaps` absorbs those duplicates.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(edges, params), fields(width = edges.width, height = edges.height))
)]
pub fn find_circles_parallel(
    edges: &GrayImageView<'_>,
    radius_min: i32,
    radius_max: i32,
    params: &HoughParams,
    workers: usize,
) -> Result<Vec<CircleItem>, HoughError> {
    params.validate()?;
    validate_radius_range(radius_min, radius_max)?;
    if workers == 0 {
        return Err(HoughError::InvalidWorkerCount);
    }
    let angles = AngleTable::new(params.phi_step_deg)?;
    let partitions = partition_radii(radius_min, radius_max, workers);
    debug!("radius partitions: {partitions:?}");

    let lists: Vec<Vec<CircleItem>> = partitions
        .into_par_iter()
        .map(|radii| {
            sweep_radii(
                edges,
                radii,
                params.cell_step,
                &angles,
                params.max_count_per_radius,
            )
        })
        .collect::<Result<_, _>>()?;
    let list: Vec<CircleItem> = lists.into_iter().flatten().collect();
    debug!(
        "parallel sweep [{radius_min}, {radius_max}]: {} circle(s)",
        list.len()
    );
    Ok(list)
}

/// Dispatch to `find_circles` or `find_circles_parallel`.
pub fn find_circles_with(
    edges: &GrayImageView<'_>,
    radius_min: i32,
    radius_max: i32,
    params: &HoughParams,
    mode: SearchMode,
) -> Result<Vec<CircleItem>, HoughError> {
    match mode {
        SearchMode::Sequential => find_circles(edges, radius_min, radius_max, params),
        SearchMode::Parallel { workers } => {
            find_circles_parallel(edges, radius_min, radius_max, params, workers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinscan_core::GrayImage;

    fn ring(width: usize, height: usize, cx: f32, cy: f32, r: f32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        let samples = (8.0 * r) as usize;
        for k in 0..samples {
            let t = k as f32 / samples as f32 * std::f32::consts::TAU;
            let x = (cx + r * t.cos()).round() as i32;
            let y = (cy + r * t.sin()).round() as i32;
            img.put(x, y, 255);
        }
        img
    }

    #[test]
    fn add_found_center_inserts_unrelated_circles() {
        let mut list = Vec::new();
        assert_eq!(
            add_found_center(&mut list, CircleItem::new(10, 10, 20, 5)),
            Merge::Inserted(0)
        );
        assert_eq!(
            add_found_center(&mut list, CircleItem::new(40, 10, 20, 5)),
            Merge::Inserted(1)
        );
        // similar center but radius grew by more than RADIUS_MATCH_PX
        assert_eq!(
            add_found_center(&mut list, CircleItem::new(10, 10, 26, 5)),
            Merge::Inserted(2)
        );
    }

    #[test]
    fn add_found_center_keeps_the_stronger_estimate() {
        let mut list = vec![CircleItem::new(100, 100, 30, 50)];
        assert_eq!(
            add_found_center(&mut list, CircleItem::new(104, 97, 32, 40)),
            Merge::Discarded(0)
        );
        assert_eq!(list[0], CircleItem::new(100, 100, 30, 50));

        assert_eq!(
            add_found_center(&mut list, CircleItem::new(103, 98, 33, 60)),
            Merge::Replaced(0)
        );
        assert_eq!(list, vec![CircleItem::new(103, 98, 33, 60)]);
    }

    #[test]
    fn add_found_center_ignores_larger_stored_radii() {
        // stored radius above the new one is outside [r - 5, r]
        let mut list = vec![CircleItem::new(50, 50, 31, 10)];
        assert_eq!(
            add_found_center(&mut list, CircleItem::new(50, 50, 30, 99)),
            Merge::Inserted(1)
        );
    }

    #[test]
    fn add_found_center_is_idempotent() {
        let mut list = vec![CircleItem::new(0, 0, 5, 1)];
        let c = CircleItem::new(60, 60, 12, 7);
        add_found_center(&mut list, c);
        let len = list.len();
        add_found_center(&mut list, c);
        assert_eq!(list.len(), len);
    }

    #[test]
    fn partitions_are_contiguous_and_disjoint() {
        let cases = [
            (15, 40, 4),
            (95, 105, 4),
            (10, 12, 4),
            (7, 7, 3),
            (1, 100, 7),
        ];
        for (min, max, workers) in cases {
            let parts = partition_radii(min, max, workers);
            assert_eq!(parts.len(), workers.min((max - min + 1) as usize));
            assert_eq!(*parts[0].start(), min);
            assert_eq!(*parts[parts.len() - 1].end(), max);
            for w in parts.windows(2) {
                assert_eq!(*w[0].end() + 1, *w[1].start());
            }
            assert!(parts.iter().all(|p| p.start() <= p.end()));
        }
    }

    #[test]
    fn partitions_hold_fewer_radii_as_radius_grows() {
        let parts = partition_radii(10, 110, 4);
        let sizes: Vec<i32> = parts.iter().map(|p| p.end() - p.start() + 1).collect();
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "{sizes:?}");
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let img = GrayImage::new(8, 8);
        let params = HoughParams::default();
        assert_eq!(
            find_circles(&img.view(), 10, 5, &params),
            Err(HoughError::InvalidRadiusRange { min: 10, max: 5 })
        );
        assert_eq!(
            find_circles_parallel(&img.view(), 1, 5, &params, 0),
            Err(HoughError::InvalidWorkerCount)
        );
    }

    #[test]
    fn blank_image_yields_no_circles() {
        let img = GrayImage::new(32, 32);
        let params = HoughParams::default();
        assert!(find_circles(&img.view(), 3, 6, &params).unwrap().is_empty());
        assert!(find_circles_parallel(&img.view(), 3, 6, &params, 2)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn finds_a_single_ring() {
        let img = ring(120, 100, 60.0, 45.0, 20.0);
        let params = HoughParams::default().with_max_count(5);
        let circles = find_circles(&img.view(), 17, 23, &params).unwrap();
        let best = circles.iter().max_by_key(|c| c.v).unwrap();
        assert!((best.x - 60).abs() <= 1, "{best}");
        assert!((best.y - 45).abs() <= 1, "{best}");
        assert!((best.r - 20).abs() <= 1, "{best}");
    }
}
