//! Dataset loading and synthetic cloud generation.
//!
//! The CSV reader ingests `id, x, y` rows and groups them into
//! [`PointCloud`]s; rows with a negative id or a coordinate outside the
//! configured range are dropped rather than rejected, so one file can carry
//! sentinel rows. The generators produce seeded, reproducible cloud batches
//! for tests and benchmarks.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::cloud::{Point, PointCloud};

/// Errors raised while reading a cloud dataset from disk.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The file could not be opened or read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// A row had a malformed field.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

fn parse_error(line: usize, message: String) -> DatasetError {
    DatasetError::Parse { line, message }
}

/// Load point clouds from a CSV file with `id, x, y` rows.
///
/// Rows are filtered, not rejected: a negative id or a coordinate outside
/// `[cmin, cmax]` drops the row. Surviving rows are grouped by id, clouds
/// ordered by first appearance and points kept in file order. Blank lines
/// are skipped; `header` skips the first line unconditionally.
///
/// # Arguments
///
/// * `path` - CSV file to read
/// * `cmin` - Smallest admissible coordinate
/// * `cmax` - Largest admissible coordinate
/// * `header` - Whether the first line is a header row
pub fn load_clouds_csv(
    path: impl AsRef<Path>,
    cmin: f64,
    cmax: f64,
    header: bool,
) -> Result<Vec<PointCloud>, DatasetError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut clouds: Vec<PointCloud> = Vec::new();
    let mut slot_by_id: HashMap<u32, usize> = HashMap::new();
    let mut rows = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if header && idx == 0 {
            continue;
        }
        let row = line.trim();
        if row.is_empty() {
            continue;
        }

        let mut fields = row.split(',').map(str::trim);
        let (id, x, y) = match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(x), Some(y)) => (id, x, y),
            _ => {
                return Err(parse_error(
                    line_no,
                    format!("expected `id, x, y`, got {row:?}"),
                ))
            }
        };

        let id: i64 = id
            .parse()
            .map_err(|_| parse_error(line_no, format!("bad cloud id {id:?}")))?;
        let x: f64 = x
            .parse()
            .map_err(|_| parse_error(line_no, format!("bad x coordinate {x:?}")))?;
        let y: f64 = y
            .parse()
            .map_err(|_| parse_error(line_no, format!("bad y coordinate {y:?}")))?;

        if id < 0 || x < cmin || x > cmax || y < cmin || y > cmax {
            continue;
        }
        let id = u32::try_from(id)
            .map_err(|_| parse_error(line_no, format!("cloud id {id} exceeds u32 range")))?;

        let slot = *slot_by_id.entry(id).or_insert_with(|| {
            clouds.push(PointCloud::new(id, Vec::new()));
            clouds.len() - 1
        });
        clouds[slot].points.push(Point::new(x, y));
        rows += 1;
    }

    debug!(
        path = %path.as_ref().display(),
        clouds = clouds.len(),
        points = rows,
        "loaded cloud dataset"
    );
    Ok(clouds)
}

/// Generate `n` clouds with ids `0..n`, points uniform over `[0, cmax)`.
pub fn synthetic_clouds(n: usize, points_per_cloud: usize, cmax: f64, seed: u64) -> Vec<PointCloud> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|id| {
            let points = (0..points_per_cloud)
                .map(|_| Point::new(rng.random_range(0.0..cmax), rng.random_range(0.0..cmax)))
                .collect();
            PointCloud::new(id as u32, points)
        })
        .collect()
}

/// Jitter every point of every cloud by up to `radius` per axis, clamped
/// into `[0, cmax)`. Ids are preserved, so the perturbed batch doubles as a
/// query set with known ground truth.
pub fn perturb_clouds(clouds: &[PointCloud], radius: f64, cmax: f64, seed: u64) -> Vec<PointCloud> {
    let mut rng = StdRng::seed_from_u64(seed);
    let hi = cmax.next_down();
    clouds
        .iter()
        .map(|cloud| {
            let points = cloud
                .points
                .iter()
                .map(|p| {
                    Point::new(
                        (p.x + rng.random_range(-radius..=radius)).clamp(0.0, hi),
                        (p.y + rng.random_range(-radius..=radius)).clamp(0.0, hi),
                    )
                })
                .collect();
            PointCloud::new(cloud.id, points)
        })
        .collect()
}
