//! Burkhard-Keller tree.
//!
//! Metric trie for discrete (integer-valued) distances: every edge is
//! labeled with the exact distance between the parent's and the child's
//! payloads, and labels are unique among siblings. A query at bound `tau`
//! only has to follow edges whose label lies in `[dist - tau, dist + tau]`,
//! by the triangle inequality.
//!
//! Nodes live in an index-based arena (`Vec<BkNode>`, children referenced
//! by index), so the tree has no recursive ownership and both insertion and
//! search are plain loops. Child lists are sorted by label once at the end
//! of the build, which turns the query window into a binary search plus a
//! short forward walk.
//!
//! Naturally real-valued metrics must be discretized consistently at build
//! and query time (see [`distance::discrete_euclidean`]); the quantization
//! error is part of the approximation contract, not a defect.
//!
//! [`distance::discrete_euclidean`]: crate::distance::discrete_euclidean
//!
//! # References
//!
//! - Burkhard, Keller (1973): "Some approaches to best-match file searching"

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::knn::{CandidateSet, MetricIndex, Neighbor};
use crate::tree::DEFAULT_BUILD_SEED;

/// Arena node: a payload plus `(edge label, child index)` pairs.
///
/// Most nodes have few children, so the pairs live inline until the list
/// outgrows the smallvec.
#[derive(Debug, Clone)]
struct BkNode<T> {
    item: T,
    children: SmallVec<[(u64, u32); 4]>,
}

/// Burkhard-Keller tree over items of type `T` under a caller-supplied
/// discrete metric.
///
/// ```
/// use cumulus::BkTree;
///
/// let mut tree = BkTree::new(|a: &i64, b: &i64| a.abs_diff(*b));
/// tree.build(vec![0, 1, 4, 9])?;
///
/// let hits = tree.knn(&3, 1)?;
/// assert_eq!(hits[0].item, 4);
/// assert_eq!(hits[0].distance, 1);
/// # Ok::<(), cumulus::IndexError>(())
/// ```
pub struct BkTree<T, D> {
    distance: D,
    nodes: Vec<BkNode<T>>,
    seed: u64,
}

impl<T, D> BkTree<T, D> {
    /// Create an empty tree with the default build seed.
    pub fn new(distance: D) -> Self {
        Self::with_seed(distance, DEFAULT_BUILD_SEED)
    }

    /// Create an empty tree whose insertion order is drawn from `seed`.
    pub fn with_seed(distance: D, seed: u64) -> Self {
        Self {
            distance,
            nodes: Vec::new(),
            seed,
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T, D> BkTree<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> u64,
{
    /// Build the tree over `items`, replacing any prior contents.
    ///
    /// Items are inserted one at a time in a seeded random order (insertion
    /// order shapes the tree but not the answers); the first insertion
    /// becomes the root. Child lists are label-sorted afterwards.
    pub fn build(&mut self, mut items: Vec<T>) -> Result<()> {
        self.nodes.clear();
        if items.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let n = items.len();
        self.nodes.reserve(n);
        let mut rng = StdRng::seed_from_u64(self.seed);
        while !items.is_empty() {
            let at = rng.random_range(0..items.len());
            let item = items.swap_remove(at);
            self.insert(item);
        }

        for node in &mut self.nodes {
            node.children.sort_unstable_by_key(|&(label, _)| label);
        }

        debug!(items = n, "bk-tree built");
        Ok(())
    }

    fn insert(&mut self, item: T) {
        if self.nodes.is_empty() {
            self.nodes.push(BkNode {
                item,
                children: SmallVec::new(),
            });
            return;
        }

        let mut cur = 0usize;
        loop {
            let d = (self.distance)(&item, &self.nodes[cur].item);
            // Child lists are unsorted until the build finishes, so probe
            // for an existing edge linearly.
            let existing = self.nodes[cur]
                .children
                .iter()
                .find(|&&(label, _)| label == d)
                .map(|&(_, child)| child);
            match existing {
                Some(child) => cur = child as usize,
                None => {
                    let idx = self.nodes.len() as u32;
                    self.nodes.push(BkNode {
                        item,
                        children: SmallVec::new(),
                    });
                    self.nodes[cur].children.push((d, idx));
                    return;
                }
            }
        }
    }

    /// The `k` nearest neighbors of `target`, ascending by distance.
    ///
    /// Only edges labeled within `[dist - tau, dist + tau]` (saturating at
    /// the integer bounds) are followed; `tau` tightens as candidates
    /// accumulate, so branches visited later see a narrower window.
    pub fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T, u64>>> {
        if self.nodes.is_empty() {
            return Err(IndexError::NotBuilt);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut best: CandidateSet<&T, u64> = CandidateSet::new(k);
        let mut stack: Vec<u32> = vec![0];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx as usize];
            let dist = (self.distance)(&node.item, target);
            let mut tau = best.worst_distance();
            if dist <= tau {
                best.offer(&node.item, dist);
                tau = best.worst_distance();
            }

            let lo = dist.saturating_sub(tau);
            let hi = dist.saturating_add(tau);
            let start = node.children.partition_point(|&(label, _)| label < lo);
            for &(label, child) in &node.children[start..] {
                if label > hi {
                    break;
                }
                stack.push(child);
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

impl<T, D> MetricIndex<T> for BkTree<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> u64,
{
    fn build(&mut self, items: Vec<T>) -> Result<()> {
        BkTree::build(self, items)
    }

    fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>> {
        Ok(BkTree::knn(self, target, k)?
            .into_iter()
            .map(|n| Neighbor {
                item: n.item,
                distance: n.distance as f64,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
