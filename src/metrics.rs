//! Request metrics and statistics tracking for the prediction service.

use crate::types::RiskLevel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the prediction endpoint
pub struct ServiceMetrics {
    /// Prediction requests received
    pub requests: AtomicU64,
    /// Predictions answered with "Low"
    pub low_risk: AtomicU64,
    /// Predictions answered with "High"
    pub high_risk: AtomicU64,
    /// Requests rejected by the schema validator
    pub validation_failures: AtomicU64,
    /// Requests failed by the model
    pub inference_failures: AtomicU64,
    /// End-to-end prediction latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            low_risk: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a served prediction
    pub fn record_prediction(&self, latency: Duration, risk: RiskLevel) {
        match risk {
            RiskLevel::Low => self.low_risk.fetch_add(1, Ordering::Relaxed),
            RiskLevel::High => self.high_risk.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            if latencies.len() > LATENCY_WINDOW {
                latencies.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn predictions(&self) -> u64 {
        self.low_risk.load(Ordering::Relaxed) + self.high_risk.load(Ordering::Relaxed)
    }

    /// Get latency statistics over the recent window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted: Vec<u64> = match self.latencies.read() {
            Ok(latencies) => latencies.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests.load(Ordering::Relaxed);
        let low = self.low_risk.load(Ordering::Relaxed);
        let high = self.high_risk.load(Ordering::Relaxed);
        let high_rate = if low + high > 0 {
            (high as f64 / (low + high) as f64) * 100.0
        } else {
            0.0
        };
        let latency = self.latency_stats();

        info!(
            requests = requests,
            throughput = format!("{:.2} req/s", self.throughput()),
            predictions = low + high,
            low_risk = low,
            high_risk = high,
            high_risk_pct = format!("{:.1}", high_rate),
            validation_failures = self.validation_failures.load(Ordering::Relaxed),
            inference_failures = self.inference_failures.load(Ordering::Relaxed),
            "Prediction summary"
        );
        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                max_us = latency.max_us,
                "Prediction latency"
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
