//! List of clusters.
//!
//! A flat metric index: `m` sampled pivots ("centers"), each owning the
//! items whose nearest center it is and a covering radius bounding how far
//! those members stray. Queries scan all `m` clusters, offering every
//! center, and only descend into a cluster's member list when the center is
//! within `covering_radius + tau` of the target; anything farther provably
//! holds no candidate. Pruning is weaker than the trees' but the index is
//! only O(m) beyond the items themselves.
//!
//! Nearest-center assignment during the build runs through a transient
//! [`VpTree`] over the centers instead of m-way linear probing.
//!
//! # References
//!
//! - Chávez, Navarro (2005): "A compact space decomposition for effective
//!   metric indexing"

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{IndexError, Result};
use crate::knn::{CandidateSet, MetricIndex, Neighbor};
use crate::tree::{VpTree, DEFAULT_BUILD_SEED};

/// One partition: a center, its members, and the radius covering them.
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    pub center: T,
    pub covering_radius: f64,
    pub members: Vec<T>,
}

/// List-of-clusters index over items of type `T` under a caller-supplied
/// continuous metric. The pivot count is fixed at construction.
pub struct ListOfClusters<T, D> {
    distance: D,
    pivots: usize,
    clusters: Vec<Cluster<T>>,
    len: usize,
    seed: u64,
}

impl<T, D> ListOfClusters<T, D> {
    /// Create an empty index that will partition around `pivots` centers.
    pub fn new(distance: D, pivots: usize) -> Self {
        Self::with_seed(distance, pivots, DEFAULT_BUILD_SEED)
    }

    /// Create an empty index whose center draws use `seed`.
    pub fn with_seed(distance: D, pivots: usize, seed: u64) -> Self {
        Self {
            distance,
            pivots,
            clusters: Vec::new(),
            len: 0,
            seed,
        }
    }

    /// Number of indexed items (centers included).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The built partitions. Empty before a successful build.
    pub fn clusters(&self) -> &[Cluster<T>] {
        &self.clusters
    }
}

impl<T, D> ListOfClusters<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> f64,
{
    /// Build the index over `items`, replacing any prior contents.
    ///
    /// Samples the centers without replacement, then routes every remaining
    /// item to its nearest center, growing that cluster's covering radius
    /// as members arrive.
    pub fn build(&mut self, mut items: Vec<T>) -> Result<()> {
        self.clusters.clear();
        self.len = 0;
        if items.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        let n = items.len();
        let m = self.pivots;
        if m == 0 || m > n {
            return Err(IndexError::InvalidParameter(format!(
                "cluster count {m} outside [1, {n}]"
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut clusters: Vec<Cluster<T>> = Vec::with_capacity(m);
        for _ in 0..m {
            let at = rng.random_range(0..items.len());
            clusters.push(Cluster {
                center: items.swap_remove(at),
                covering_radius: 0.0,
                members: Vec::new(),
            });
        }

        {
            let d = &self.distance;
            let mut center_tree =
                VpTree::with_seed(|a: &(usize, T), b: &(usize, T)| d(&a.1, &b.1), self.seed);
            center_tree.build(
                clusters
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, c.center.clone()))
                    .collect(),
            )?;

            for item in items {
                let hit = center_tree.knn(&(0, item.clone()), 1)?;
                let nearest = &hit[0];
                let cluster = &mut clusters[nearest.item.0];
                if nearest.distance > cluster.covering_radius {
                    cluster.covering_radius = nearest.distance;
                }
                cluster.members.push(item);
            }
        }

        self.clusters = clusters;
        self.len = n;
        debug!(items = n, clusters = m, "list of clusters built");
        Ok(())
    }

    /// The `k` nearest neighbors of `target`, ascending by distance.
    ///
    /// The center pass is linear in the cluster count; a member list is
    /// scanned only when its center lies within `covering_radius + tau`.
    pub fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>> {
        if self.clusters.is_empty() {
            return Err(IndexError::NotBuilt);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut best: CandidateSet<&T> = CandidateSet::new(k);
        for cluster in &self.clusters {
            let d = (self.distance)(&cluster.center, target);
            best.offer(&cluster.center, d);

            let tau = best.worst_distance();
            if d <= cluster.covering_radius + tau {
                for member in &cluster.members {
                    best.offer(member, (self.distance)(member, target));
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

impl<T, D> MetricIndex<T> for ListOfClusters<T, D>
where
    T: Clone,
    D: Fn(&T, &T) -> f64,
{
    fn build(&mut self, items: Vec<T>) -> Result<()> {
        ListOfClusters::build(self, items)
    }

    fn knn(&self, target: &T, k: usize) -> Result<Vec<Neighbor<T>>> {
        ListOfClusters::knn(self, target, k)
    }

    fn len(&self) -> usize {
        self.len
    }
}
