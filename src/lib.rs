//! cumulus: metric indexing and KNN search for 2D point clouds.
//!
//! Search over collections of point clouds (trajectories, minutiae sets,
//! spectrogram peak constellations) through two data paths:
//!
//! - `tree/` + `voting`: clouds flatten into owner-tagged points indexed by
//!   a metric tree (vantage-point tree, BK-tree, List of Clusters); a query
//!   cloud runs one point-level KNN per point and candidate clouds are
//!   ranked by how many of those neighbors they own.
//! - `bitmap/`: each cloud collapses to the set of grid cells it occupies,
//!   Elias-Fano coded with rank/select; whole clouds are then ranked by a
//!   set distance (cosine, Hamming, Jaccard) under a vantage-point tree.
//!
//! # Critical Nuances
//!
//! ## Pruning Soundness
//!
//! Every tree here prunes subtrees with the triangle inequality, so the
//! supplied distance must be symmetric and triangle-honest. A
//! near-metric (e.g. a floored Euclidean that can undershoot by one) does
//! not error: pruning just becomes slightly optimistic and recall degrades
//! silently. Measure with [`eval`] rather than assuming exactness.
//!
//! ## Where Approximation Enters
//!
//! Point-level `knn` on a built tree is exact for a true metric. Cloud
//! ranking is not: votes only count neighbors surfaced within `internal_k`
//! per query point, so a cloud whose points always rank just outside that
//! window scores zero. Raising `internal_k` trades query time for recall.
//!
//! ## Build Determinism
//!
//! Vantage points, cluster centers, and BK insertion order are drawn from a
//! seeded RNG. The same items, seed, and parameters rebuild the identical
//! structure, which also fixes result order among equal distances.

pub mod bitmap;
pub mod cloud;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod eval;
pub mod knn;
pub mod tree;
pub mod voting;

// Re-exports
pub use bitmap::{BitmapCloudIndex, CellGrid, CloudBitmap, SetDistance, SparseBitmap};
pub use cloud::{CloudPoint, Point, PointCloud};
pub use dataset::{load_clouds_csv, perturb_clouds, synthetic_clouds, DatasetError};
pub use error::{IndexError, Result};
pub use eval::{run_recall_eval, EvalReport};
pub use knn::{CandidateSet, DistanceValue, MetricIndex, Neighbor};
pub use tree::{BkTree, Cluster, ListOfClusters, VpTree};
pub use voting::CloudVotingIndex;
