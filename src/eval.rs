//! Self-retrieval recall and latency reporting for cloud-level search.
//!
//! The harness is generic over a search closure: it feeds each query cloud
//! to the closure, times the call, and checks at which rank the query's own
//! id comes back. Recall@N over a batch is the fraction of queries whose id
//! appears among the first N returned clouds. Perturbed copies of indexed
//! clouds (see [`crate::dataset::perturb_clouds`]) make this a standard
//! robustness measurement.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cloud::PointCloud;

/// Recall and latency statistics for one evaluated query batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Recall@N per requested level, keyed by N.
    pub recall_at: BTreeMap<usize, f64>,
    /// Per-query wall-clock latencies in microseconds, in query order.
    pub latencies_us: Vec<u64>,
}

impl EvalReport {
    /// Mean query latency in microseconds.
    pub fn avg_latency_us(&self) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }
        self.latencies_us.iter().sum::<u64>() as f64 / self.latencies_us.len() as f64
    }

    /// Sample standard deviation of query latency (n - 1 denominator).
    pub fn sd_latency_us(&self) -> f64 {
        let n = self.latencies_us.len();
        if n < 2 {
            return 0.0;
        }
        let avg = self.avg_latency_us();
        let var = self
            .latencies_us
            .iter()
            .map(|&t| {
                let delta = t as f64 - avg;
                delta * delta
            })
            .sum::<f64>()
            / (n - 1) as f64;
        var.sqrt()
    }

    /// Fastest query in microseconds.
    pub fn min_latency_us(&self) -> u64 {
        self.latencies_us.iter().copied().min().unwrap_or(0)
    }

    /// Slowest query in microseconds.
    pub fn max_latency_us(&self) -> u64 {
        self.latencies_us.iter().copied().max().unwrap_or(0)
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let recalls: Vec<String> = self
            .recall_at
            .iter()
            .map(|(n, r)| format!("r@{n}={r:.3}"))
            .collect();
        format!(
            "{} queries: {}, avg={:.1}us, sd={:.1}us, min={}us, max={}us",
            self.latencies_us.len(),
            recalls.join(", "),
            self.avg_latency_us(),
            self.sd_latency_us(),
            self.min_latency_us(),
            self.max_latency_us()
        )
    }
}

/// Run every query through `search_fn` and report self-retrieval recall.
///
/// `search_fn` returns ranked cloud ids, best first; a query scores a hit at
/// level `N` when its own id is among the first `N`. Levels are reported
/// even when the query batch is empty (as recall 0).
pub fn run_recall_eval<F>(
    queries: &[PointCloud],
    recall_levels: &[usize],
    search_fn: F,
) -> EvalReport
where
    F: Fn(&PointCloud) -> Vec<u32>,
{
    let mut hits: BTreeMap<usize, usize> = recall_levels.iter().map(|&n| (n, 0)).collect();
    let mut latencies_us = Vec::with_capacity(queries.len());

    for query in queries {
        let start = Instant::now();
        let ranked = search_fn(query);
        latencies_us.push(start.elapsed().as_micros() as u64);

        for (&level, hit_count) in hits.iter_mut() {
            if ranked.iter().take(level).any(|&id| id == query.id) {
                *hit_count += 1;
            }
        }
    }

    let recall_at = hits
        .into_iter()
        .map(|(level, hit_count)| {
            let recall = if queries.is_empty() {
                0.0
            } else {
                hit_count as f64 / queries.len() as f64
            };
            (level, recall)
        })
        .collect();

    let report = EvalReport {
        recall_at,
        latencies_us,
    };
    debug!(summary = %report.summary(), "recall evaluation finished");
    report
}
