//! Shared k-nearest-neighbor machinery.
//!
//! Every search structure in this crate funnels results through the same
//! bounded collector, [`CandidateSet`]: a max-heap of at most `k` candidates
//! whose worst retained distance is the pruning bound `tau` the branch-and-
//! bound traversals consult. The collector is generic over the distance
//! value so the continuous trees (`f64`) and the discrete BK-tree (`u64`)
//! share one implementation.
//!
//! [`MetricIndex`] is the common build/query contract the point-level
//! structures implement, letting the cloud-level voting layer wrap any of
//! them interchangeably.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;

/// Distance values the search structures can order and bound.
///
/// Implemented for `f64` (continuous metrics) and `u64` (discrete metrics).
pub trait DistanceValue: Copy + PartialOrd {
    /// Sentinel larger than every real distance; the pruning bound while
    /// the candidate set is below capacity.
    const UNBOUNDED: Self;

    /// The self-distance of any item under a conforming metric.
    const ZERO: Self;

    /// Total order over distance values (NaN-safe for floats).
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl DistanceValue for f64 {
    const UNBOUNDED: Self = f64::INFINITY;
    const ZERO: Self = 0.0;

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

impl DistanceValue for u64 {
    const UNBOUNDED: Self = u64::MAX;
    const ZERO: Self = 0;

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

/// One search result: an item and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<T, D = f64> {
    pub item: T,
    pub distance: D,
}

/// Heap entry. `seq` is a monotone insertion counter so equal distances
/// drain in insertion order.
struct Entry<T, D> {
    item: T,
    distance: D,
    seq: u64,
}

impl<T, D: DistanceValue> PartialEq for Entry<T, D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T, D: DistanceValue> Eq for Entry<T, D> {}

impl<T, D: DistanceValue> PartialOrd for Entry<T, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, D: DistanceValue> Ord for Entry<T, D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Bounded best-`k` collector.
///
/// Holds at most `capacity` `(item, distance)` pairs in a max-heap keyed by
/// distance, so the currently-worst retained candidate is readable in O(1).
/// [`offer`](Self::offer) admits unconditionally below capacity and
/// afterwards only on strict improvement over the worst; that strictness is
/// what lets callers pre-filter with `dist <= tau` without churning ties.
///
/// A `capacity` of 0 is a legal always-empty set.
pub struct CandidateSet<T, D = f64> {
    capacity: usize,
    heap: BinaryHeap<Entry<T, D>>,
    next_seq: u64,
}

impl<T, D: DistanceValue> CandidateSet<T, D> {
    /// Create a collector retaining at most `capacity` candidates.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1)),
            next_seq: 0,
        }
    }

    /// Offer a candidate. Below capacity it is always retained; at capacity
    /// it replaces the worst retained candidate only if strictly closer.
    pub fn offer(&mut self, item: T, distance: D) {
        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.push(item, distance);
        } else if let Some(worst) = self.heap.peek() {
            if distance.total_cmp(&worst.distance) == Ordering::Less {
                self.heap.pop();
                self.push(item, distance);
            }
        }
    }

    fn push(&mut self, item: T, distance: D) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            item,
            distance,
            seq,
        });
    }

    /// The pruning bound `tau`: the worst retained distance once full,
    /// [`DistanceValue::UNBOUNDED`] while below capacity.
    pub fn worst_distance(&self) -> D {
        if self.heap.len() < self.capacity {
            D::UNBOUNDED
        } else {
            // A zero-capacity set is full while holding nothing.
            self.heap.peek().map_or(D::ZERO, |e| e.distance)
        }
    }

    /// Number of retained candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no candidates are retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a vector ascending by distance, ties in insertion order.
    pub fn into_sorted(self) -> Vec<Neighbor<T, D>> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| Neighbor {
                item: e.item,
                distance: e.distance,
            })
            .collect()
    }
}

/// Common contract of the point-level metric indexes.
///
/// `build` replaces any previous contents; `knn` returns up to `k`
/// neighbors ascending by distance and fails with
/// [`IndexError::NotBuilt`](crate::IndexError::NotBuilt) before a
/// successful build.
pub trait MetricIndex<T> {
    /// Build the index over `items`, replacing prior contents.
    fn build(&mut self, items: Vec<T>) -> Result<()>;

    /// The `k` nearest neighbors of `target`, ascending by distance.
    fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>>;

    /// Number of indexed items.
    fn len(&self) -> usize;

    /// Whether the index holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
