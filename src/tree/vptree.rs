//! Vantage-point tree.
//!
//! Binary metric tree: each node holds a pivot and the median distance from
//! that pivot to the rest of its sub-range ("threshold"). Items closer than
//! the threshold go left, the rest go right. Queries walk the tree with a
//! shrinking bound `tau` (the worst retained candidate) and skip any child
//! that provably cannot hold something closer, which only works when the
//! distance is a true metric.
//!
//! Nodes live in a flat, 1-indexed array shaped like a complete binary tree
//! (children of slot `p` at `2p` and `2p + 1`), with vacancy expressed as
//! `None`; both build and search run iteratively over explicit stacks, so
//! degenerate shapes cannot overflow the call stack.
//!
//! # References
//!
//! - Uhlmann (1991): "Satisfying general proximity/similarity queries with
//!   metric trees"
//! - Yianilos (1993): "Data structures and algorithms for nearest neighbor
//!   search in general metric spaces"

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::knn::{CandidateSet, MetricIndex, Neighbor};
use crate::tree::DEFAULT_BUILD_SEED;

/// One occupied slot: a pivot and its median-distance split.
#[derive(Debug, Clone)]
struct VpNode<T> {
    item: T,
    threshold: f64,
}

/// Vantage-point tree over items of type `T` under a caller-supplied
/// continuous metric.
///
/// ```
/// use cumulus::{distance, Point, VpTree};
///
/// let mut tree = VpTree::new(distance::euclidean);
/// tree.build(vec![
///     Point::new(0.0, 0.0),
///     Point::new(5.0, 5.0),
///     Point::new(9.0, 1.0),
/// ])?;
///
/// let hits = tree.knn(&Point::new(4.5, 5.0), 1)?;
/// assert_eq!(hits[0].item, Point::new(5.0, 5.0));
/// # Ok::<(), cumulus::IndexError>(())
/// ```
pub struct VpTree<T, D> {
    distance: D,
    /// 1-indexed complete-binary-tree slots; index 0 is never occupied.
    slots: Vec<Option<VpNode<T>>>,
    len: usize,
    seed: u64,
}

impl<T, D> VpTree<T, D> {
    /// Create an empty tree with the default build seed.
    pub fn new(distance: D) -> Self {
        Self::with_seed(distance, DEFAULT_BUILD_SEED)
    }

    /// Create an empty tree whose pivot draws use `seed`.
    pub fn with_seed(distance: D, seed: u64) -> Self {
        Self {
            distance,
            slots: Vec::new(),
            len: 0,
            seed,
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T, D> VpTree<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> f64,
{
    /// Build the tree over `items`, replacing any prior contents.
    ///
    /// Runs in O(n log n) expected time: one partial selection per node
    /// locates the median-by-distance element without fully sorting the
    /// range.
    pub fn build(&mut self, mut items: Vec<T>) -> Result<()> {
        self.slots.clear();
        self.len = 0;
        if items.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let n = items.len();
        // Smallest complete tree with at least n slots: 2^(floor(log2 n)+1) - 1
        // usable positions. Slot 0 stays vacant so child math is 2p / 2p+1.
        let size = 1usize << (n.ilog2() + 1);
        let mut slots: Vec<Option<VpNode<T>>> = Vec::with_capacity(size);
        slots.resize_with(size, || None);

        let mut rng = StdRng::seed_from_u64(self.seed);
        // Half-open sub-ranges of the scratch buffer, paired with the slot
        // each range's pivot lands in.
        let mut work: Vec<(usize, usize, usize)> = vec![(1, 0, n)];

        while let Some((slot, lo, hi)) = work.pop() {
            debug_assert!(slot < size && lo < hi);

            if hi - lo == 1 {
                slots[slot] = Some(VpNode {
                    item: items[lo].clone(),
                    threshold: 0.0,
                });
                continue;
            }

            let pivot_at = rng.random_range(lo..hi);
            items.swap(pivot_at, hi - 1);

            // Partition the remaining range around its median distance to
            // the pivot; the median element itself starts the right half.
            let median = (hi - lo - 1) / 2;
            let threshold = {
                let (rest, pivot) = items[lo..hi].split_at_mut(hi - lo - 1);
                let pivot = &pivot[0];
                let d = &self.distance;
                rest.select_nth_unstable_by(median, |a, b| {
                    d(pivot, a).total_cmp(&d(pivot, b))
                });
                d(pivot, &rest[median])
            };

            slots[slot] = Some(VpNode {
                item: items[hi - 1].clone(),
                threshold,
            });

            let mid = lo + median;
            if mid > lo {
                work.push((2 * slot, lo, mid));
            }
            if hi - 1 > mid {
                work.push((2 * slot + 1, mid, hi - 1));
            }
        }

        self.slots = slots;
        self.len = n;
        debug!(items = n, slots = size - 1, "vp-tree built");
        Ok(())
    }

    /// The `k` nearest neighbors of `target`, ascending by distance.
    ///
    /// Branch-and-bound over an explicit slot stack. With `dist` the
    /// target-to-pivot distance and `dm` the node threshold, the near child
    /// is visited when `dist - tau <= dm` and the far child when
    /// `dist + tau >= dm`; both tests can pass at once. The likelier child
    /// is pushed last so it pops first and tightens `tau` early.
    pub fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>> {
        if self.slots.is_empty() {
            return Err(IndexError::NotBuilt);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut best: CandidateSet<&T> = CandidateSet::new(k);
        let mut stack: Vec<usize> = vec![1];

        while let Some(slot) = stack.pop() {
            let node = match self.slots.get(slot) {
                Some(Some(node)) => node,
                _ => continue,
            };

            let dist = (self.distance)(&node.item, target);
            let mut tau = best.worst_distance();
            if dist <= tau {
                best.offer(&node.item, dist);
                tau = best.worst_distance();
            }

            let dm = node.threshold;
            let near = 2 * slot;
            let far = 2 * slot + 1;
            if dist < dm {
                if dist + tau >= dm {
                    stack.push(far);
                }
                if dist - tau <= dm {
                    stack.push(near);
                }
            } else {
                if dist - tau <= dm {
                    stack.push(near);
                }
                if dist + tau >= dm {
                    stack.push(far);
                }
            }
        }

        Ok(best
            .into_sorted()
            .into_iter()
            .map(|n| Neighbor {
                item: n.item.clone(),
                distance: n.distance,
            })
            .collect())
    }
}

impl<T, D> MetricIndex<T> for VpTree<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> f64,
{
    fn build(&mut self, items: Vec<T>) -> Result<()> {
        VpTree::build(self, items)
    }

    fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>> {
        VpTree::knn(self, target, k)
    }

    fn len(&self) -> usize {
        self.len
    }
}
