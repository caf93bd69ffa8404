//! Distance metrics over 2D points.
//!
//! All search structures in this crate take the metric as a plain function
//! or closure, so these free functions plug in directly. Pruning soundness
//! requires symmetry and the triangle inequality; a non-metric "distance"
//! will not error, it will silently miss neighbors.
//!
//! The `cloud_*` variants operate on [`CloudPoint`]s and ignore the owner
//! tag, which is the shape the point-level indexes inside
//! [`CloudVotingIndex`](crate::voting::CloudVotingIndex) need.

use crate::cloud::{CloudPoint, Point};

/// Euclidean (L2) distance.
#[inline]
#[must_use]
pub fn euclidean(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Manhattan (L1) distance.
#[inline]
#[must_use]
pub fn manhattan(a: &Point, b: &Point) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Euclidean distance floored to an integer.
///
/// BK-trees label edges with exact distance values, so a real-valued metric
/// has to be discretized consistently at build and query time. Flooring
/// keeps the triangle inequality (within the 1-unit quantization error the
/// caller accepts by choosing a discrete index).
#[inline]
#[must_use]
pub fn discrete_euclidean(a: &Point, b: &Point) -> u64 {
    euclidean(a, b).floor() as u64
}

/// Euclidean distance between tagged points, ignoring the owner tag.
#[inline]
#[must_use]
pub fn cloud_euclidean(a: &CloudPoint, b: &CloudPoint) -> f64 {
    euclidean(&a.point, &b.point)
}

/// Manhattan distance between tagged points, ignoring the owner tag.
#[inline]
#[must_use]
pub fn cloud_manhattan(a: &CloudPoint, b: &CloudPoint) -> f64 {
    manhattan(&a.point, &b.point)
}

/// Floored Euclidean distance between tagged points, ignoring the owner tag.
#[inline]
#[must_use]
pub fn cloud_discrete_euclidean(a: &CloudPoint, b: &CloudPoint) -> u64 {
    discrete_euclidean(&a.point, &b.point)
}
