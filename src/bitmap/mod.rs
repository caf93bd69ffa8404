//! Succinct bitmap representation of point clouds and set distances over it.
//!
//! Pipeline: [`CellGrid`] discretizes a cloud into occupied grid cells,
//! [`SparseBitmap`] stores that cell set Elias-Fano-compressed with
//! rank/select, [`distance`] computes cosine/Hamming/Jaccard between two
//! such sets by a select-driven merge, and [`BitmapCloudIndex`] puts a
//! vantage-point tree on top for whole-cloud KNN.

pub mod distance;
pub mod grid;
pub mod index;
pub mod sparse;

pub use distance::{cosine, hamming, jaccard, overlap, Overlap};
pub use grid::CellGrid;
pub use index::{BitmapCloudIndex, CloudBitmap, SetDistance};
pub use sparse::SparseBitmap;
