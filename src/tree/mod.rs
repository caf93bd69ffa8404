//! Metric tree indexes.
//!
//! Three structures with the same build-once / query-many lifecycle and the
//! same triangle-inequality pruning idea, differing in how they carve up the
//! space:
//!
//! - [`VpTree`]: median-distance binary partition, continuous metrics.
//! - [`BkTree`]: exact-distance trie, discrete (integer) metrics.
//! - [`ListOfClusters`]: a flat list of pivots with covering radii, cheaper
//!   to build, weaker pruning.

pub mod bktree;
pub mod clusters;
pub mod vptree;

pub use bktree::BkTree;
pub use clusters::{Cluster, ListOfClusters};
pub use vptree::VpTree;

/// Build RNG seed used when the caller does not supply one. Pivot choice
/// affects tree balance, never result correctness, so a fixed default keeps
/// builds reproducible.
pub(crate) const DEFAULT_BUILD_SEED: u64 = 42;
