use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use workflow::{QueryRequest, WorkflowEngine};

use crate::test_set::LabelledQuery;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub classifier_mode: String,
    pub total_queries: usize,
    /// Share of labelled queries whose final analysis type matched.
    pub analysis_type_accuracy: f64,
    pub query_type_accuracy: f64,
    pub completed_rate: f64,
    pub by_analysis_type: Vec<TypeAccuracy>,
    pub latency: LatencyStats,
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAccuracy {
    pub category: String,
    pub correct: usize,
    pub count: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mismatch {
    pub query: String,
    pub expected: String,
    pub actual: String,
}

/// Runs labelled queries through an engine and scores the outcome.
pub struct Benchmarker {
    engine: WorkflowEngine,
}

impl Benchmarker {
    pub fn new(engine: WorkflowEngine) -> Self {
        Self { engine }
    }

    pub async fn run_benchmark(&self, test_set: &[LabelledQuery]) -> BenchmarkResults {
        info!(
            queries = test_set.len(),
            classifier = self.engine.classifier_mode(),
            "Running benchmark"
        );

        let mut latencies = Vec::with_capacity(test_set.len());
        let mut by_category: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut query_type_hits = (0usize, 0usize);
        let mut completed = 0;
        let mut mismatches = Vec::new();

        for labelled in test_set {
            let start = Instant::now();
            let outcome = self.engine.run(QueryRequest::new(&labelled.query)).await;
            latencies.push(start.elapsed().as_secs_f64() * 1000.0);

            if outcome.output.is_completed() {
                completed += 1;
            }

            let actual = outcome.state.analysis_type.as_ref();
            let hit = actual == labelled.expected_analysis_type.as_ref();
            let entry = by_category.entry(labelled.category()).or_insert((0, 0));
            entry.1 += 1;
            if hit {
                entry.0 += 1;
            } else {
                mismatches.push(Mismatch {
                    query: labelled.query.clone(),
                    expected: labelled.category(),
                    actual: actual.map(|a| a.as_str().to_string()).unwrap_or_else(|| "none".into()),
                });
            }

            if let Some(expected) = &labelled.expected_query_type {
                query_type_hits.1 += 1;
                if outcome.state.query_type.as_ref() == Some(expected) {
                    query_type_hits.0 += 1;
                } else {
                    debug!(query = %labelled.query, expected = %expected, "Query type mismatch");
                }
            }
        }

        for mismatch in &mismatches {
            warn!(
                query = %mismatch.query,
                expected = %mismatch.expected,
                actual = %mismatch.actual,
                "Analysis type mismatch"
            );
        }

        let correct: usize = by_category.values().map(|(c, _)| c).sum();
        let by_analysis_type = by_category
            .into_iter()
            .map(|(category, (correct, count))| TypeAccuracy {
                category,
                correct,
                count,
                accuracy: ratio(correct, count),
            })
            .collect();

        BenchmarkResults {
            classifier_mode: self.engine.classifier_mode().to_string(),
            total_queries: test_set.len(),
            analysis_type_accuracy: ratio(correct, test_set.len()),
            query_type_accuracy: ratio(query_type_hits.0, query_type_hits.1),
            completed_rate: ratio(completed, test_set.len()),
            by_analysis_type,
            latency: latency_stats(latencies),
            mismatches,
        }
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

fn latency_stats(mut latencies: Vec<f64>) -> LatencyStats {
    if latencies.is_empty() {
        return LatencyStats::default();
    }
    latencies.sort_by(|a, b| a.total_cmp(b));

    let mean_ms = statistical::mean(&latencies);
    // Sample standard deviation needs at least two points
    let std_dev_ms = if latencies.len() < 2 {
        0.0
    } else {
        statistical::standard_deviation(&latencies, Some(mean_ms))
    };

    LatencyStats {
        mean_ms,
        std_dev_ms,
        p50_ms: statistical::median(&latencies),
        p95_ms: percentile(&latencies, 95),
    }
}

fn percentile(sorted_data: &[f64], p: usize) -> f64 {
    let index = (p as f64 / 100.0 * sorted_data.len() as f64) as usize;
    sorted_data[index.min(sorted_data.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_has_zero_spread() {
        let stats = latency_stats(vec![12.0]);
        assert_eq!(stats.mean_ms, 12.0);
        assert_eq!(stats.std_dev_ms, 0.0);
        assert_eq!(stats.p95_ms, 12.0);
    }

    #[test]
    fn test_percentiles_over_sorted_latencies() {
        let stats = latency_stats(vec![5.0, 1.0, 3.0, 2.0, 4.0]);
        assert_eq!(stats.p50_ms, 3.0);
        assert_eq!(stats.p95_ms, 5.0);
        assert!(stats.std_dev_ms > 0.0);
    }

    #[test]
    fn test_ratio_of_empty_set() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(3, 4), 0.75);
    }
}
