use std::fmt;

use serde::{Deserialize, Serialize};

/// One detected circle in edge-image pixel coordinates.
///
/// `v` is the accumulator vote count at the center; it is the strength used
/// to pick between duplicate and overlapping detections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircleItem {
    pub x: i32,
    pub y: i32,
    pub r: i32,
    pub v: i32,
}

impl CircleItem {
    pub const fn new(x: i32, y: i32, r: i32, v: i32) -> Self {
        Self { x, y, r, v }
    }

    /// True when the two discs intersect (center distance < r1 + r2).
    #[inline]
    pub fn overlaps(&self, other: &CircleItem) -> bool {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let min_dist = i64::from(self.r + other.r);
        dx * dx + dy * dy < min_dist * min_dist
    }

    /// Same circle translated by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

impl fmt::Display for CircleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} y={} r={} v={}", self.x, self.y, self.r, self.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_circles_do_not_overlap() {
        let a = CircleItem::new(0, 0, 10, 1);
        let b = CircleItem::new(20, 0, 10, 1);
        assert!(!a.overlaps(&b));
        let c = CircleItem::new(19, 0, 10, 1);
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn display_lists_all_fields() {
        let c = CircleItem::new(3, 4, 5, 6);
        assert_eq!(c.to_string(), "x=3 y=4 r=5 v=6");
        assert_eq!(c.translated(1, -1), CircleItem::new(4, 3, 5, 6));
    }
}
