//! Set distances between sparse bitmaps.
//!
//! Everything here reduces to one [`overlap`] pass: a merge over the two
//! position sets driven by repeated `select`, never materializing either
//! side. Cosine, Hamming and Jaccard are then arithmetic on
//! `{intersection, ones_x, ones_y}`.
//!
//! All three are plain `fn(&SparseBitmap, &SparseBitmap) -> f64`, so they
//! plug straight into [`VpTree`](crate::tree::VpTree) as the metric for
//! whole-cloud indexing.

use std::cmp::Ordering;
use std::f64::consts::FRAC_PI_2;

use crate::bitmap::sparse::SparseBitmap;

/// Intersection cardinality plus both sides' set-bit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub intersection: u64,
    pub ones_x: u64,
    pub ones_y: u64,
}

/// Merge-walk both position sets in increasing order: equal positions count
/// toward the intersection and advance both cursors, otherwise the smaller
/// side advances. Stops when either cursor runs off its set.
pub fn overlap(x: &SparseBitmap, y: &SparseBitmap) -> Overlap {
    let ones_x = x.count_ones();
    let ones_y = y.count_ones();
    let mut intersection = 0;
    let (mut i, mut j) = (1u64, 1u64);

    while i <= ones_x && j <= ones_y {
        let px = x.nth_position(i);
        let py = y.nth_position(j);
        match px.cmp(&py) {
            Ordering::Equal => {
                intersection += 1;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }

    Overlap {
        intersection,
        ones_x,
        ones_y,
    }
}

/// Cosine angular distance `acos(|X ∩ Y| / √(|X| · |Y|))`, in `[0, π/2]`.
///
/// The ratio is clamped to 1 before `acos` to absorb floating-point
/// overshoot; an empty side counts as fully disjoint. Taking one square
/// root of the product keeps identical sets at a ratio of exactly 1, so
/// the self-distance is exactly 0.
pub fn cosine(x: &SparseBitmap, y: &SparseBitmap) -> f64 {
    let o = overlap(x, y);
    if o.ones_x == 0 || o.ones_y == 0 {
        return FRAC_PI_2;
    }
    let ratio = o.intersection as f64 / (o.ones_x as f64 * o.ones_y as f64).sqrt();
    if ratio >= 1.0 {
        0.0
    } else {
        ratio.acos()
    }
}

/// Hamming distance `|X| + |Y| - 2·|X ∩ Y|` (symmetric difference size).
pub fn hamming(x: &SparseBitmap, y: &SparseBitmap) -> f64 {
    let o = overlap(x, y);
    (o.ones_x + o.ones_y - 2 * o.intersection) as f64
}

/// Jaccard distance `1 - |X ∩ Y| / |X ∪ Y|`; two empty sets are at
/// distance 0.
pub fn jaccard(x: &SparseBitmap, y: &SparseBitmap) -> f64 {
    let o = overlap(x, y);
    let union = o.ones_x + o.ones_y - o.intersection;
    if union == 0 {
        return 0.0;
    }
    1.0 - o.intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn bitmap(universe: u64, positions: &[u64]) -> SparseBitmap {
        SparseBitmap::from_positions(universe, positions.iter().copied()).unwrap()
    }

    #[test]
    fn test_overlap_known_sets() {
        let x = bitmap(16, &[1, 3, 5, 7]);
        let y = bitmap(16, &[3, 5, 9]);

        let o = overlap(&x, &y);
        assert_eq!(o.intersection, 2);
        assert_eq!(o.ones_x, 4);
        assert_eq!(o.ones_y, 3);
    }

    #[test]
    fn test_jaccard_known_sets() {
        let x = bitmap(16, &[1, 3, 5, 7]);
        let y = bitmap(16, &[3, 5, 9]);
        // 1 - 2/5
        assert!((jaccard(&x, &y) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_hamming_known_sets() {
        let x = bitmap(16, &[1, 3, 5, 7]);
        let y = bitmap(16, &[3, 5, 9]);
        assert_eq!(hamming(&x, &y), 3.0);
    }

    #[test]
    fn test_identical_sets_are_at_distance_zero() {
        let x = bitmap(256, &[0, 17, 99, 200]);
        assert_eq!(cosine(&x, &x), 0.0);
        assert_eq!(hamming(&x, &x), 0.0);
        assert_eq!(jaccard(&x, &x), 0.0);
    }

    #[test]
    fn test_disjoint_sets_are_maximally_far() {
        let x = bitmap(64, &[1, 2, 3]);
        let y = bitmap(64, &[10, 20, 30]);
        assert_eq!(cosine(&x, &y), FRAC_PI_2);
        assert_eq!(hamming(&x, &y), 6.0);
        assert_eq!(jaccard(&x, &y), 1.0);
    }

    #[test]
    fn test_empty_side_clamps() {
        let x = bitmap(64, &[]);
        let y = bitmap(64, &[5, 6]);
        assert_eq!(cosine(&x, &y), FRAC_PI_2);
        assert_eq!(hamming(&x, &y), 2.0);
        assert_eq!(jaccard(&x, &y), 1.0);
        assert_eq!(jaccard(&x, &x), 0.0);
        assert_eq!(hamming(&x, &x), 0.0);
    }

    #[test]
    fn test_overlap_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(777);
        for _ in 0..20 {
            let universe = 2_000u64;
            let a: BTreeSet<u64> = (0..rng.random_range(0..400))
                .map(|_| rng.random_range(0..universe))
                .collect();
            let b: BTreeSet<u64> = (0..rng.random_range(0..400))
                .map(|_| rng.random_range(0..universe))
                .collect();

            let x = SparseBitmap::from_positions(universe, a.iter().copied()).unwrap();
            let y = SparseBitmap::from_positions(universe, b.iter().copied()).unwrap();

            let o = overlap(&x, &y);
            assert_eq!(o.intersection, a.intersection(&b).count() as u64);
            assert_eq!(o.ones_x, a.len() as u64);
            assert_eq!(o.ones_y, b.len() as u64);
        }
    }
}
