//! Uniform grid discretization of point clouds.
//!
//! A cloud becomes the set of grid cells its points occupy: cell size
//! `delta` over the square coordinate range `[0, cmax)`, cells numbered
//! row-major. That occupancy set is what [`SparseBitmap`] compresses.

use serde::{Deserialize, Serialize};

use crate::bitmap::sparse::SparseBitmap;
use crate::cloud::{Point, PointCloud};
use crate::error::{IndexError, Result};

/// Grid shape: `cmax / delta` cells per axis (integer division), universe
/// `(cmax / delta)²`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    cmax: u32,
    delta: u32,
}

impl CellGrid {
    /// Create a grid over `[0, cmax)` with cells of size `delta`.
    pub fn new(cmax: u32, delta: u32) -> Result<Self> {
        if delta == 0 || delta > cmax {
            return Err(IndexError::InvalidParameter(format!(
                "cell size {delta} outside [1, {cmax}]"
            )));
        }
        Ok(Self { cmax, delta })
    }

    /// Upper coordinate bound.
    pub fn cmax(&self) -> u32 {
        self.cmax
    }

    /// Cell size.
    pub fn delta(&self) -> u32 {
        self.delta
    }

    /// Cells per axis.
    pub fn cells_per_axis(&self) -> u64 {
        u64::from(self.cmax / self.delta)
    }

    /// Total number of cells (the bitmap universe).
    pub fn universe(&self) -> u64 {
        let per_axis = self.cells_per_axis();
        per_axis * per_axis
    }

    /// Row-major cell index of a point: `⌊x/delta⌋ + cells_per_axis·⌊y/delta⌋`.
    ///
    /// Assumes ingestion-validated coordinates in `[0, cmax)`; negative
    /// values saturate to column/row 0 under the float-to-int cast.
    pub fn cell_of(&self, p: &Point) -> u64 {
        let delta = f64::from(self.delta);
        let col = (p.x / delta) as u64;
        let row = (p.y / delta) as u64;
        col + self.cells_per_axis() * row
    }

    /// Occupancy bitmap of a cloud: one set bit per occupied cell, points
    /// sharing a cell collapse into it.
    pub fn bitmap(&self, cloud: &PointCloud) -> Result<SparseBitmap> {
        let cells: Vec<u64> = cloud.points.iter().map(|p| self.cell_of(p)).collect();
        SparseBitmap::from_positions(self.universe(), cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(matches!(
            CellGrid::new(100, 0),
            Err(IndexError::InvalidParameter(_))
        ));
        assert!(matches!(
            CellGrid::new(100, 101),
            Err(IndexError::InvalidParameter(_))
        ));
        assert!(CellGrid::new(100, 100).is_ok());
    }

    #[test]
    fn test_cell_numbering_is_row_major() {
        let grid = CellGrid::new(100, 10).unwrap();
        assert_eq!(grid.cells_per_axis(), 10);
        assert_eq!(grid.universe(), 100);

        assert_eq!(grid.cell_of(&Point::new(0.0, 0.0)), 0);
        assert_eq!(grid.cell_of(&Point::new(9.9, 0.0)), 0);
        assert_eq!(grid.cell_of(&Point::new(10.0, 0.0)), 1);
        assert_eq!(grid.cell_of(&Point::new(0.0, 10.0)), 10);
        assert_eq!(grid.cell_of(&Point::new(95.0, 95.0)), 99);
    }

    #[test]
    fn test_bitmap_collapses_shared_cells() {
        let grid = CellGrid::new(100, 10).unwrap();
        let cloud = PointCloud::new(
            1,
            vec![
                Point::new(1.0, 1.0),
                Point::new(2.0, 3.0), // same cell as above
                Point::new(55.0, 5.0),
            ],
        );

        let bm = grid.bitmap(&cloud).unwrap();
        assert_eq!(bm.count_ones(), 2);
        assert!(bm.contains(0));
        assert!(bm.contains(5));
    }

    #[test]
    fn test_out_of_range_point_is_rejected_by_universe() {
        let grid = CellGrid::new(100, 10).unwrap();
        let cloud = PointCloud::new(1, vec![Point::new(250.0, 250.0)]);
        assert!(matches!(
            grid.bitmap(&cloud),
            Err(IndexError::InvalidParameter(_))
        ));
    }
}
