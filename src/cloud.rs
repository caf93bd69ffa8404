//! Point cloud data model.
//!
//! A [`PointCloud`] is a named, ordered set of 2D points. Indexing flattens
//! clouds into [`CloudPoint`]s, each point carrying the id of the cloud it
//! came from, so point-level search results can be aggregated back to
//! cloud-level answers.

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point cloud: an id plus its points.
///
/// Ids are expected to be unique across every cloud offered to the same
/// index; point order is preserved from construction. Coordinate validation
/// happens at ingestion, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub id: u32,
    pub points: Vec<Point>,
}

impl PointCloud {
    /// Create a cloud from an id and its points.
    pub fn new(id: u32, points: Vec<Point>) -> Self {
        Self { id, points }
    }

    /// Number of points in the cloud.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cloud has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate the cloud's points tagged with this cloud's id.
    pub fn tagged_points(&self) -> impl Iterator<Item = CloudPoint> + '_ {
        let id = self.id;
        self.points.iter().map(move |&point| CloudPoint {
            point,
            cloud_id: id,
        })
    }
}

/// One point tagged with its owning cloud's id.
///
/// The tag rides along through index construction untouched; distances over
/// `CloudPoint`s are lifted point metrics that ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    pub point: Point,
    pub cloud_id: u32,
}

impl CloudPoint {
    /// Tag a point with a cloud id.
    pub fn new(point: Point, cloud_id: u32) -> Self {
        Self { point, cloud_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_points_carry_owner_id() {
        let cloud = PointCloud::new(7, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
        let tagged: Vec<CloudPoint> = cloud.tagged_points().collect();

        assert_eq!(tagged.len(), 2);
        assert!(tagged.iter().all(|cp| cp.cloud_id == 7));
        assert_eq!(tagged[0].point, Point::new(1.0, 2.0));
        assert_eq!(tagged[1].point, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_empty_cloud() {
        let cloud = PointCloud::new(0, vec![]);
        assert!(cloud.is_empty());
        assert_eq!(cloud.len(), 0);
        assert_eq!(cloud.tagged_points().count(), 0);
    }
}
