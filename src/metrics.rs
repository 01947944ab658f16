//! Refresh cycle metrics collection and reporting
//!
//! Tracks cycle latency percentiles, success rate and skipped ticks for the engine.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for the refresh cycles of one engine
#[derive(Debug, Clone, PartialEq)]
pub struct CycleMetrics {
    /// Name of the fetcher driving the cycles
    pub fetcher_name: String,
    /// 50th percentile latency of successful cycles in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful cycles in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of completed cycles
    pub total_cycles: u64,
    /// Number of failed cycles
    pub failed_cycles: u64,
    /// Scheduled ticks skipped because a cycle was in flight
    pub skipped_ticks: u64,
}

impl CycleMetrics {
    /// Creates metrics with no data
    pub fn empty(fetcher_name: &str) -> Self {
        Self {
            fetcher_name: fetcher_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_cycles: 0,
            failed_cycles: 0,
            skipped_ticks: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total: u64,
    failed: u64,
    skipped: u64,
}

/// Collects and computes refresh cycle metrics
pub struct MetricsCollector {
    fetcher_name: String,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector
    pub fn new(fetcher_name: &str) -> Self {
        Self {
            fetcher_name: fetcher_name.to_string(),
            counters: RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records a finished cycle with its duration and outcome
    pub async fn record_cycle(&self, duration: Duration, success: bool) {
        let duration_ms = duration.as_secs_f64() * 1000.0;
        let mut counters = self.counters.write().await;

        counters.total += 1;
        if !success {
            counters.failed += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms,
            success,
        });
    }

    /// Records a scheduled tick that was skipped
    pub async fn record_skipped_tick(&self) {
        self.counters.write().await.skipped += 1;
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> CycleMetrics {
        let counters = self.counters.read().await;

        let mut metrics = CycleMetrics::empty(&self.fetcher_name);
        metrics.skipped_ticks = counters.skipped;
        if counters.samples.is_empty() {
            return metrics;
        }

        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();

        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        metrics.latency_p50_ms = percentile(&latencies, 50.0);
        metrics.latency_p99_ms = percentile(&latencies, 99.0);
        metrics.total_cycles = counters.total;
        metrics.failed_cycles = counters.failed;
        if counters.total > 0 {
            metrics.success_rate = (counters.total - counters.failed) as f64 / counters.total as f64;
        }

        metrics
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_cycle(Duration::from_millis(100), true).await;
        collector.record_cycle(Duration::from_millis(200), true).await;
        collector.record_cycle(Duration::from_millis(150), false).await;
        collector.record_skipped_tick().await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.fetcher_name, "test");
        assert_eq!(metrics.total_cycles, 3);
        assert_eq!(metrics.failed_cycles, 1);
        assert_eq!(metrics.skipped_ticks, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let collector = MetricsCollector::new("test");
        assert_eq!(collector.get_metrics().await, CycleMetrics::empty("test"));
    }

    #[tokio::test]
    async fn test_sample_window_is_bounded() {
        let collector = MetricsCollector::new("test");
        for _ in 0..(MAX_SAMPLES + 20) {
            collector.record_cycle(Duration::from_millis(5), true).await;
        }

        assert_eq!(collector.counters.read().await.samples.len(), MAX_SAMPLES);
        assert_eq!(collector.get_metrics().await.total_cycles, (MAX_SAMPLES + 20) as u64);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
