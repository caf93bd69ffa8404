//! Cloud-level KNN by per-point search and vote aggregation.
//!
//! The index flattens every cloud into tagged points and hands them to any
//! point-level [`MetricIndex`] (vantage-point tree, BK-tree, list of
//! clusters) whose distance ignores the tag. A cloud-level query then runs
//! one bounded KNN per query point and counts, per indexed cloud, how many
//! of those nearby points it owns; clouds are ranked by that vote count.
//!
//! Vote ties rank the smaller cloud id first, so results are deterministic
//! for a given built index.

use std::collections::HashMap;

use tracing::debug;

use crate::cloud::{CloudPoint, PointCloud};
use crate::error::{IndexError, Result};
use crate::knn::MetricIndex;

/// Vote-aggregating cloud index over a point-level metric index.
///
/// The wrapped index decides the metric and the pruning behavior; the
/// voting layer is the same for all of them.
///
/// ```
/// use cumulus::{distance, CloudVotingIndex, Point, PointCloud, VpTree};
///
/// let tree = VpTree::new(distance::cloud_euclidean);
/// let mut index = CloudVotingIndex::new(tree);
/// index.build(&[
///     PointCloud::new(1, vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]),
///     PointCloud::new(2, vec![Point::new(80.0, 80.0), Point::new(81.0, 81.0)]),
/// ])?;
///
/// let query = PointCloud::new(0, vec![Point::new(1.2, 1.1), Point::new(2.1, 1.9)]);
/// let ranked = index.knn(&query, 1, 1)?;
/// assert_eq!(ranked, vec![(1, 2)]);
/// # Ok::<(), cumulus::IndexError>(())
/// ```
pub struct CloudVotingIndex<I> {
    index: I,
    cloud_sizes: HashMap<u32, usize>,
}

impl<I> CloudVotingIndex<I>
where
    I: MetricIndex<CloudPoint>,
{
    /// Wrap an unbuilt point-level index. Its distance must ignore the
    /// cloud tag (see the `cloud_*` functions in [`crate::distance`]).
    pub fn new(index: I) -> Self {
        Self {
            index,
            cloud_sizes: HashMap::new(),
        }
    }

    /// Number of indexed clouds.
    pub fn num_clouds(&self) -> usize {
        self.cloud_sizes.len()
    }

    /// Total number of indexed points across all clouds.
    pub fn num_points(&self) -> usize {
        self.index.len()
    }

    /// Point count of one indexed cloud, if present.
    pub fn cloud_size(&self, cloud_id: u32) -> Option<usize> {
        self.cloud_sizes.get(&cloud_id).copied()
    }

    /// Flatten `clouds` into tagged points and build the wrapped index,
    /// replacing any prior contents. Cloud ids must be unique.
    pub fn build(&mut self, clouds: &[PointCloud]) -> Result<()> {
        self.cloud_sizes.clear();

        let total: usize = clouds.iter().map(PointCloud::len).sum();
        let mut items = Vec::with_capacity(total);
        for cloud in clouds {
            if self.cloud_sizes.insert(cloud.id, cloud.len()).is_some() {
                self.cloud_sizes.clear();
                return Err(IndexError::InvalidParameter(format!(
                    "duplicate cloud id {}",
                    cloud.id
                )));
            }
            items.extend(cloud.tagged_points());
        }

        match self.index.build(items) {
            Ok(()) => {
                debug!(
                    clouds = clouds.len(),
                    points = total,
                    "cloud voting index built"
                );
                Ok(())
            }
            Err(e) => {
                self.cloud_sizes.clear();
                Err(e)
            }
        }
    }

    /// The `k` highest-voted clouds for `query`, as `(cloud id, votes)`
    /// in descending vote order (ties by ascending id).
    ///
    /// Each of the query's points contributes up to `internal_k` votes:
    /// one per nearby indexed point, credited to that point's owner. Fewer
    /// than `k` distinct voted clouds returns all of them.
    pub fn knn(&self, query: &PointCloud, k: usize, internal_k: usize) -> Result<Vec<(u32, u32)>> {
        if self.cloud_sizes.is_empty() {
            return Err(IndexError::NotBuilt);
        }

        let mut votes: HashMap<u32, u32> = HashMap::new();
        for probe in query.tagged_points() {
            for hit in self.index.knn(&probe, internal_k)? {
                *votes.entry(hit.item.cloud_id).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(u32, u32)> = votes.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::Point;
    use crate::distance::{cloud_discrete_euclidean, cloud_euclidean};
    use crate::tree::{BkTree, ListOfClusters, VpTree};

    fn three_clouds() -> Vec<PointCloud> {
        vec![
            PointCloud::new(
                1,
                vec![
                    Point::new(1.0, 1.0),
                    Point::new(2.0, 2.0),
                    Point::new(3.0, 3.0),
                    Point::new(4.0, 4.0),
                ],
            ),
            PointCloud::new(
                2,
                vec![
                    Point::new(100.0, 100.0),
                    Point::new(101.0, 101.0),
                    Point::new(102.0, 102.0),
                    Point::new(103.0, 103.0),
                ],
            ),
            PointCloud::new(
                3,
                vec![
                    Point::new(200.0, 10.0),
                    Point::new(201.0, 11.0),
                    Point::new(202.0, 12.0),
                    Point::new(203.0, 13.0),
                ],
            ),
        ]
    }

    #[test]
    fn test_identical_query_takes_all_votes() {
        let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        index.build(&three_clouds()).unwrap();
        assert_eq!(index.num_clouds(), 3);
        assert_eq!(index.num_points(), 12);
        assert_eq!(index.cloud_size(1), Some(4));

        let query = PointCloud::new(0, three_clouds()[0].points.clone());
        let ranked = index.knn(&query, 1, 1).unwrap();
        assert_eq!(ranked, vec![(1, 4)]);
    }

    #[test]
    fn test_votes_bounded_by_query_size_times_internal_k() {
        let clouds = three_clouds();
        let query = PointCloud::new(0, clouds[0].points.clone());

        for internal_k in [1, 2, 3] {
            let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
            index.build(&clouds).unwrap();
            let ranked = index.knn(&query, 3, internal_k).unwrap();

            let cap = (query.len() * internal_k) as u32;
            assert!(ranked.iter().all(|&(_, votes)| votes <= cap));
            let total: u32 = ranked.iter().map(|&(_, v)| v).sum();
            assert_eq!(total, cap);
        }
    }

    #[test]
    fn test_same_ranking_with_every_inner_index() {
        let clouds = three_clouds();
        let query = PointCloud::new(0, clouds[1].points.clone());

        let mut vp = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        let mut bk = CloudVotingIndex::new(BkTree::new(cloud_discrete_euclidean));
        let mut lc = CloudVotingIndex::new(ListOfClusters::new(cloud_euclidean, 3));
        vp.build(&clouds).unwrap();
        bk.build(&clouds).unwrap();
        lc.build(&clouds).unwrap();

        let expected = vec![(2u32, 4u32)];
        assert_eq!(vp.knn(&query, 1, 1).unwrap(), expected);
        assert_eq!(bk.knn(&query, 1, 1).unwrap(), expected);
        assert_eq!(lc.knn(&query, 1, 1).unwrap(), expected);
    }

    #[test]
    fn test_vote_ties_rank_lower_id_first() {
        // One query point equidistant-ish probes: each cloud gets exactly
        // one vote with internal_k high enough to span both clouds.
        let clouds = vec![
            PointCloud::new(7, vec![Point::new(0.0, 0.0)]),
            PointCloud::new(3, vec![Point::new(10.0, 0.0)]),
        ];
        let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        index.build(&clouds).unwrap();

        let query = PointCloud::new(0, vec![Point::new(5.0, 0.0)]);
        let ranked = index.knn(&query, 2, 2).unwrap();
        assert_eq!(ranked, vec![(3, 1), (7, 1)]);
    }

    #[test]
    fn test_fewer_voted_clouds_than_k() {
        let clouds = three_clouds();
        let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        index.build(&clouds).unwrap();

        let query = PointCloud::new(0, vec![Point::new(1.5, 1.5)]);
        let ranked = index.knn(&query, 10, 1).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 1);
    }

    #[test]
    fn test_duplicate_cloud_id_fails() {
        let clouds = vec![
            PointCloud::new(5, vec![Point::new(0.0, 0.0)]),
            PointCloud::new(5, vec![Point::new(1.0, 1.0)]),
        ];
        let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        assert!(matches!(
            index.build(&clouds),
            Err(IndexError::InvalidParameter(_))
        ));
        assert!(index.knn(&PointCloud::new(0, vec![]), 1, 1).is_err());
    }

    #[test]
    fn test_empty_build_fails_and_empty_query_votes_nothing() {
        let mut index = CloudVotingIndex::new(VpTree::new(cloud_euclidean));
        assert_eq!(index.build(&[]), Err(IndexError::EmptyIndex));

        index.build(&three_clouds()).unwrap();
        let ranked = index.knn(&PointCloud::new(0, vec![]), 5, 1).unwrap();
        assert!(ranked.is_empty());
    }
}
