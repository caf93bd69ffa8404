//! Whole-cloud indexing over bitmap distances.
//!
//! Each indexed cloud collapses to a single `(bitmap, cloud id)` item; a
//! [`VpTree`] over those items under one of the set distances answers
//! cloud-level KNN directly, with no per-point voting pass. Queries are
//! discretized with the same grid the index was built with.

use std::collections::HashSet;

use tracing::debug;

use crate::bitmap::distance;
use crate::bitmap::grid::CellGrid;
use crate::bitmap::sparse::SparseBitmap;
use crate::cloud::PointCloud;
use crate::error::{IndexError, Result};
use crate::tree::VpTree;

/// Which set distance the index compares occupancy bitmaps with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetDistance {
    /// Cosine angular distance, `[0, π/2]`.
    Cosine,
    /// Symmetric difference cardinality.
    Hamming,
    /// Jaccard distance, `[0, 1]`.
    Jaccard,
}

impl SetDistance {
    /// Evaluate this distance on two bitmaps.
    pub fn distance(self, x: &SparseBitmap, y: &SparseBitmap) -> f64 {
        match self {
            SetDistance::Cosine => distance::cosine(x, y),
            SetDistance::Hamming => distance::hamming(x, y),
            SetDistance::Jaccard => distance::jaccard(x, y),
        }
    }

    fn metric(self) -> fn(&CloudBitmap, &CloudBitmap) -> f64 {
        match self {
            SetDistance::Cosine => cosine_between,
            SetDistance::Hamming => hamming_between,
            SetDistance::Jaccard => jaccard_between,
        }
    }
}

/// One cloud's occupancy bitmap tagged with its id.
#[derive(Debug, Clone)]
pub struct CloudBitmap {
    pub cloud_id: u32,
    pub bitmap: SparseBitmap,
}

fn cosine_between(a: &CloudBitmap, b: &CloudBitmap) -> f64 {
    distance::cosine(&a.bitmap, &b.bitmap)
}

fn hamming_between(a: &CloudBitmap, b: &CloudBitmap) -> f64 {
    distance::hamming(&a.bitmap, &b.bitmap)
}

fn jaccard_between(a: &CloudBitmap, b: &CloudBitmap) -> f64 {
    distance::jaccard(&a.bitmap, &b.bitmap)
}

/// Cloud-level KNN index: grid discretization, one bitmap per cloud, a
/// vantage-point tree over the bitmaps.
///
/// ```
/// use cumulus::{BitmapCloudIndex, CellGrid, Point, PointCloud, SetDistance};
///
/// let grid = CellGrid::new(100, 10)?;
/// let mut index = BitmapCloudIndex::new(grid, SetDistance::Jaccard);
/// index.build(&[
///     PointCloud::new(1, vec![Point::new(5.0, 5.0), Point::new(15.0, 5.0)]),
///     PointCloud::new(2, vec![Point::new(85.0, 85.0)]),
/// ])?;
///
/// let query = PointCloud::new(0, vec![Point::new(6.0, 4.0), Point::new(14.0, 6.0)]);
/// let ranked = index.knn(&query, 1)?;
/// assert_eq!(ranked[0].0, 1);
/// # Ok::<(), cumulus::IndexError>(())
/// ```
pub struct BitmapCloudIndex {
    grid: CellGrid,
    tree: VpTree<CloudBitmap, fn(&CloudBitmap, &CloudBitmap) -> f64>,
}

impl BitmapCloudIndex {
    /// Create an index over `grid` comparing clouds with `metric`.
    pub fn new(grid: CellGrid, metric: SetDistance) -> Self {
        Self {
            grid,
            tree: VpTree::new(metric.metric()),
        }
    }

    /// The grid queries are discretized with.
    pub fn grid(&self) -> CellGrid {
        self.grid
    }

    /// Number of indexed clouds.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether no clouds are indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Build over `clouds`, replacing any prior contents. Cloud ids must be
    /// unique.
    pub fn build(&mut self, clouds: &[PointCloud]) -> Result<()> {
        let mut seen = HashSet::with_capacity(clouds.len());
        let mut items = Vec::with_capacity(clouds.len());
        for cloud in clouds {
            if !seen.insert(cloud.id) {
                return Err(IndexError::InvalidParameter(format!(
                    "duplicate cloud id {}",
                    cloud.id
                )));
            }
            items.push(CloudBitmap {
                cloud_id: cloud.id,
                bitmap: self.grid.bitmap(cloud)?,
            });
        }

        self.tree.build(items)?;
        debug!(clouds = clouds.len(), universe = self.grid.universe(), "bitmap cloud index built");
        Ok(())
    }

    /// The `k` most similar indexed clouds, ascending by bitmap distance.
    pub fn knn(&self, query: &PointCloud, k: usize) -> Result<Vec<(u32, f64)>> {
        let probe = CloudBitmap {
            cloud_id: 0,
            bitmap: self.grid.bitmap(query)?,
        };
        Ok(self
            .tree
            .knn(&probe, k)?
            .into_iter()
            .map(|n| (n.item.cloud_id, n.distance))
            .collect())
    }
}
