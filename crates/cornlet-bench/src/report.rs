//! Benchmark results.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::runner::ClientStats;
use crate::stats::LatencySummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub duration_secs: f64,
    pub requests_per_second: f64,
    pub latency_ms: LatencySummary,
}

impl Report {
    pub fn new(stats: ClientStats, elapsed: Duration) -> Self {
        let duration_secs = elapsed.as_secs_f64();
        let total_requests = stats.total();
        let requests_per_second = if duration_secs > 0.0 {
            total_requests as f64 / duration_secs
        } else {
            0.0
        };

        Self {
            total_requests,
            successful: stats.successful,
            failed: stats.failed,
            duration_secs,
            requests_per_second,
            latency_ms: LatencySummary::from_samples(&stats.latencies_ms),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(40);
        let l = &self.latency_ms;
        writeln!(f, "Results:")?;
        writeln!(f, "  Total Requests:    {}", self.total_requests)?;
        writeln!(f, "  Successful:        {}", self.successful)?;
        writeln!(f, "  Failed:            {}", self.failed)?;
        writeln!(f, "  Duration:          {:.2} s", self.duration_secs)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Requests Per Second: {:.2} req/s", self.requests_per_second)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Latency (ms):")?;
        writeln!(f, "    Avg:    {:.2}", l.mean)?;
        writeln!(f, "    Min:    {:.2}", l.min)?;
        writeln!(f, "    Max:    {:.2}", l.max)?;
        writeln!(f, "    Median: {:.2}", l.median)?;
        writeln!(f, "    P95:    {:.2}", l.p95)?;
        write!(f, "    P99:    {:.2}", l.p99)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> ClientStats {
        ClientStats {
            successful: 90,
            failed: 10,
            latencies_ms: vec![1.0, 2.0, 3.0],
        }
    }

    #[test]
    fn rps_counts_successful_and_failed() {
        let report = Report::new(stats(), Duration::from_millis(2500));
        assert_eq!(report.total_requests, 100);
        assert!((report.requests_per_second - 40.0).abs() < 1e-9);
        assert!((report.duration_secs - 2.5).abs() < 1e-9);
        assert_eq!(report.latency_ms.median, 2.0);
    }

    #[test]
    fn zero_duration_has_zero_rps() {
        let report = Report::new(stats(), Duration::ZERO);
        assert_eq!(report.requests_per_second, 0.0);
    }

    #[test]
    fn renders_counts_and_latencies() {
        let text = Report::new(stats(), Duration::from_secs(10)).to_string();
        assert!(text.contains("Total Requests:    100"));
        assert!(text.contains("Failed:            10"));
        assert!(text.contains("Requests Per Second: 10.00 req/s"));
        assert!(text.contains("Median: 2.00"));
    }

    #[test]
    fn serializes_as_json() {
        let report = Report::new(stats(), Duration::from_secs(10));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total_requests"], 100);
        assert_eq!(value["latency_ms"]["max"], 3.0);
    }
}
