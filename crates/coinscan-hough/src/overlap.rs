use coinscan_core::CircleItem;
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

const REMOVED: i32 = -1;

/// Remove overlapping circles, keeping the one with more votes.
///
/// Every live pair `(i, j)` whose discs intersect loses its weaker member;
/// on equal votes `j` is removed. Afterwards no two remaining circles have
/// a center distance below the sum of their radii. Quadratic in the list
/// length.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(circles), fields(n = circles.len()))
)]
pub fn resolve_overlaps(circles: &mut Vec<CircleItem>) {
    let n = circles.len();
    for i in 0..n {
        if circles[i].v < 0 {
            continue;
        }
        for j in 0..n {
            if i == j || circles[j].v < 0 {
                continue;
            }
            if !circles[i].overlaps(&circles[j]) {
                continue;
            }
            if circles[i].v < circles[j].v {
                circles[i].v = REMOVED;
                break;
            }
            circles[j].v = REMOVED;
        }
    }
    let before = circles.len();
    circles.retain(|c| c.v >= 0);
    debug!("overlaps resolved: {before} -> {}", circles.len());
}
