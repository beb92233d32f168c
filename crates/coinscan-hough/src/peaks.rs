use serde::{Deserialize, Serialize};

use crate::Accumulator;

/// Radius (in cells) of the disk cleared around each extracted maximum.
pub const PEAK_SUPPRESSION_RADIUS: i32 = 5;

/// A center candidate in image pixel coordinates with its vote count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    pub x: i32,
    pub y: i32,
    pub votes: u32,
}

/// Take the global maximum out of `acc`.
///
/// The disk of `PEAK_SUPPRESSION_RADIUS` cells around the maximum is zeroed
/// so the next call yields the next distinct peak. Returns `None` once no
/// cell holds a vote.
pub fn extract_peak(acc: &mut Accumulator) -> Option<Peak> {
    let (ax, ay, votes) = acc.max_cell()?;
    if votes < 1 {
        return None;
    }
    acc.suppress_disk(ax, ay, PEAK_SUPPRESSION_RADIUS);
    let (x, y) = acc.cell_to_pixel(ax, ay);
    Some(Peak { x, y, votes })
}

/// Peaks of one radius under the relative stopping rule.
///
/// Extraction stops at the first peak weaker than the first one taken, when
/// the accumulator is exhausted, or after `max_count` extractions.
pub fn radius_peaks(acc: &mut Accumulator, max_count: usize) -> Vec<Peak> {
    let mut out = Vec::new();
    let mut first: Option<u32> = None;
    for _ in 0..max_count {
        let Some(peak) = extract_peak(acc) else {
            break;
        };
        let first_votes = *first.get_or_insert(peak.votes);
        if peak.votes < first_votes {
            break;
        }
        out.push(peak);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc_with(votes: &[((f32, f32), u32)]) -> Accumulator {
        let mut acc = Accumulator::new(100, 100, 2, 1.0).unwrap();
        for &((a, b), n) in votes {
            for _ in 0..n {
                acc.vote(a, b);
            }
        }
        acc
    }

    #[test]
    fn empty_accumulator_has_no_peak() {
        let mut acc = Accumulator::new(10, 10, 2, 1.0).unwrap();
        assert_eq!(extract_peak(&mut acc), None);
    }

    #[test]
    fn peaks_come_out_strongest_first() {
        let mut acc = acc_with(&[((10.0, 10.0), 3), ((50.0, 60.0), 7)]);
        assert_eq!(
            extract_peak(&mut acc),
            Some(Peak {
                x: 50,
                y: 60,
                votes: 7
            })
        );
        assert_eq!(
            extract_peak(&mut acc),
            Some(Peak {
                x: 10,
                y: 10,
                votes: 3
            })
        );
        assert_eq!(extract_peak(&mut acc), None);
    }

    #[test]
    fn nearby_weaker_cells_are_suppressed() {
        let mut acc = acc_with(&[((20.0, 20.0), 9), ((23.0, 20.0), 8)]);
        assert_eq!(extract_peak(&mut acc).map(|p| p.votes), Some(9));
        assert_eq!(extract_peak(&mut acc), None);
    }

    #[test]
    fn stopping_rule_keeps_only_peaks_as_strong_as_the_first() {
        let mut acc = acc_with(&[
            ((10.0, 10.0), 5),
            ((40.0, 40.0), 5),
            ((70.0, 70.0), 4),
            ((90.0, 10.0), 5),
        ]);
        let peaks = radius_peaks(&mut acc, 10);
        // equal maxima are all taken before the 4-vote peak ends the sweep
        assert_eq!(peaks.len(), 3);
        assert!(peaks.iter().all(|p| p.votes == 5));
    }

    #[test]
    fn stopping_rule_honours_max_count() {
        let mut acc = acc_with(&[((10.0, 10.0), 5), ((40.0, 40.0), 5), ((70.0, 70.0), 5)]);
        assert_eq!(radius_peaks(&mut acc, 2).len(), 2);
    }
}
