//! Concurrent GET clients.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::{StatusCode, Url};
use tokio::task::JoinSet;

use crate::report::Report;

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub url: Url,
    pub clients: usize,
    pub duration: Duration,
    /// Per-request bound so a stalled endpoint cannot outlive the run.
    pub request_timeout: Duration,
}

impl BenchConfig {
    pub fn new(url: &str, clients: usize, duration: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid target URL '{url}'"))?;
        anyhow::ensure!(
            matches!(url.scheme(), "http" | "https"),
            "target URL '{url}' must use http:// or https://"
        );
        anyhow::ensure!(clients > 0, "at least one client is required");
        Ok(Self {
            url,
            clients,
            duration,
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Counters for one or more clients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientStats {
    pub successful: u64,
    pub failed: u64,
    /// Latency of every completed response, milliseconds.
    pub latencies_ms: Vec<f64>,
}

impl ClientStats {
    /// A response was fully read; only 200 counts as success.
    pub fn record_response(&mut self, status: StatusCode, latency: Duration) {
        self.latencies_ms.push(latency.as_secs_f64() * 1000.0);
        if status == StatusCode::OK {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    /// The request failed before a response was read.
    pub fn record_error(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u64 {
        self.successful + self.failed
    }

    pub fn merge(&mut self, other: ClientStats) {
        self.successful += other.successful;
        self.failed += other.failed;
        self.latencies_ms.extend(other.latencies_ms);
    }
}

/// Run `config.clients` clients against the target until the duration elapses.
pub async fn run(config: &BenchConfig) -> anyhow::Result<Report> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(config.clients)
        .timeout(config.request_timeout)
        .build()
        .context("failed to build HTTP client")?;

    tracing::info!(
        url = %config.url,
        clients = config.clients,
        duration_secs = config.duration.as_secs_f64(),
        "Starting benchmark"
    );

    let started = Instant::now();
    let deadline = started + config.duration;

    let mut tasks = JoinSet::new();
    for _ in 0..config.clients {
        tasks.spawn(client_loop(client.clone(), config.url.clone(), deadline));
    }

    let mut stats = ClientStats::default();
    while let Some(joined) = tasks.join_next().await {
        stats.merge(joined.context("benchmark client task failed")?);
    }
    let elapsed = started.elapsed();

    tracing::info!(
        total = stats.total(),
        elapsed_secs = elapsed.as_secs_f64(),
        "Benchmark finished"
    );
    Ok(Report::new(stats, elapsed))
}

async fn client_loop(client: reqwest::Client, url: Url, deadline: Instant) -> ClientStats {
    let mut stats = ClientStats::default();
    while Instant::now() < deadline {
        let start = Instant::now();
        let result = match client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                response.bytes().await.map(|_| status)
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(status) => stats.record_response(status, start.elapsed()),
            Err(e) => {
                tracing::debug!(error = %e, "Request failed");
                stats.record_error();
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn config_rejects_bad_input() {
        let d = Duration::from_secs(1);
        assert!(BenchConfig::new("not a url", 1, d).is_err());
        assert!(BenchConfig::new("ftp://localhost/", 1, d).is_err());
        assert!(BenchConfig::new("http://localhost:8000/", 0, d).is_err());
        assert!(BenchConfig::new("http://localhost:8000/", 50, d).is_ok());
    }

    #[test]
    fn stats_count_non_200_as_failure() {
        let mut stats = ClientStats::default();
        stats.record_response(StatusCode::OK, Duration::from_millis(2));
        stats.record_response(StatusCode::INTERNAL_SERVER_ERROR, Duration::from_millis(4));
        stats.record_error();

        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.latencies_ms, vec![2.0, 4.0]);
    }

    #[test]
    fn merge_adds_counts_and_samples() {
        let mut a = ClientStats {
            successful: 2,
            failed: 1,
            latencies_ms: vec![1.0, 2.0],
        };
        a.merge(ClientStats {
            successful: 3,
            failed: 0,
            latencies_ms: vec![3.0],
        });
        assert_eq!(a.successful, 5);
        assert_eq!(a.failed, 1);
        assert_eq!(a.latencies_ms, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn counts_successful_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello, World!"))
            .mount(&server)
            .await;

        let url = format!("{}/", server.uri());
        let config = BenchConfig::new(&url, 2, Duration::from_millis(200)).unwrap();
        let report = run(&config).await.unwrap();

        assert!(report.total_requests > 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.successful, report.total_requests);
        assert!(report.latency_ms.min > 0.0);
        assert!(report.latency_ms.max >= report.latency_ms.median);
    }

    #[tokio::test]
    async fn counts_error_statuses_as_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let url = format!("{}/", server.uri());
        let config = BenchConfig::new(&url, 1, Duration::from_millis(100)).unwrap();
        let report = run(&config).await.unwrap();

        assert!(report.total_requests > 0);
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, report.total_requests);
    }

    #[tokio::test]
    async fn unreachable_target_only_fails() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/");
        let config = BenchConfig::new(&url, 1, Duration::from_millis(50))
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));
        let report = run(&config).await.unwrap();

        assert!(report.failed > 0);
        assert_eq!(report.successful, 0);
        assert_eq!(report.latency_ms.median, 0.0);
    }
}
