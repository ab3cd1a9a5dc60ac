//! Pluggable malware-scan backends.
//!
//! Backends are tried in order; the first one that completes (whatever its
//! verdict) determines the result. A backend that errors or times out is
//! skipped. If every backend is unavailable the caller treats the scan as
//! unavailable rather than blocking the upload.

#[cfg(feature = "clamav")]
mod clamav;
mod heuristic;
mod reputation;

#[cfg(feature = "clamav")]
pub use clamav::ClamAvScanner;
pub use heuristic::HeuristicScanner;
pub use reputation::{HashReputationScanner, UploadScanner};

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Verdict from a scan backend that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected(String),
}

/// A backend failed to produce a verdict (unreachable, misconfigured, timed
/// out). This is availability information, not a verdict.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ScanError(pub String);

#[async_trait]
pub trait Scanner: Send + Sync {
    /// Backend name used in logs and warnings.
    fn name(&self) -> &'static str;

    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScanError>;
}

/// Result of running the configured backend chain.
#[derive(Debug)]
pub enum ScanChainOutcome {
    /// A backend completed; its verdict stands.
    Completed {
        backend: &'static str,
        verdict: ScanVerdict,
    },
    /// Every backend was unavailable.
    Unavailable { failures: Vec<String> },
}

/// Run the backend chain in order with a per-backend timeout.
pub async fn run_scan_chain(
    scanners: &[Arc<dyn Scanner>],
    path: &Path,
    timeout: Duration,
) -> ScanChainOutcome {
    let mut failures = Vec::new();

    for scanner in scanners {
        match tokio::time::timeout(timeout, scanner.scan(path)).await {
            Ok(Ok(verdict)) => {
                tracing::debug!(backend = scanner.name(), "Scan backend completed");
                return ScanChainOutcome::Completed {
                    backend: scanner.name(),
                    verdict,
                };
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = scanner.name(), error = %e, "Scan backend failed");
                failures.push(format!("{}: {}", scanner.name(), e));
            }
            Err(_) => {
                tracing::warn!(
                    backend = scanner.name(),
                    timeout_secs = timeout.as_secs(),
                    "Scan backend timed out"
                );
                failures.push(format!("{}: timed out", scanner.name()));
            }
        }
    }

    ScanChainOutcome::Unavailable { failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubScanner {
        name: &'static str,
        result: Result<ScanVerdict, String>,
    }

    #[async_trait]
    impl Scanner for StubScanner {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn scan(&self, _path: &Path) -> Result<ScanVerdict, ScanError> {
            self.result.clone().map_err(ScanError)
        }
    }

    struct HangingScanner;

    #[async_trait]
    impl Scanner for HangingScanner {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn scan(&self, _path: &Path) -> Result<ScanVerdict, ScanError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ScanVerdict::Clean)
        }
    }

    #[tokio::test]
    async fn first_completed_backend_wins() {
        let scanners: Vec<Arc<dyn Scanner>> = vec![
            Arc::new(StubScanner {
                name: "down",
                result: Err("connection refused".to_string()),
            }),
            Arc::new(StubScanner {
                name: "up",
                result: Ok(ScanVerdict::Infected("Eicar-Test".to_string())),
            }),
            Arc::new(StubScanner {
                name: "never-reached",
                result: Ok(ScanVerdict::Clean),
            }),
        ];

        let outcome = run_scan_chain(
            &scanners,
            Path::new("/tmp/file"),
            Duration::from_secs(5),
        )
        .await;

        match outcome {
            ScanChainOutcome::Completed { backend, verdict } => {
                assert_eq!(backend, "up");
                assert_eq!(verdict, ScanVerdict::Infected("Eicar-Test".to_string()));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn all_backends_down_reports_unavailable() {
        let scanners: Vec<Arc<dyn Scanner>> = vec![
            Arc::new(StubScanner {
                name: "a",
                result: Err("dns failure".to_string()),
            }),
            Arc::new(StubScanner {
                name: "b",
                result: Err("connection refused".to_string()),
            }),
        ];

        let outcome = run_scan_chain(
            &scanners,
            Path::new("/tmp/file"),
            Duration::from_secs(5),
        )
        .await;

        match outcome {
            ScanChainOutcome::Unavailable { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("dns failure"));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn timed_out_backend_is_skipped() {
        let scanners: Vec<Arc<dyn Scanner>> = vec![
            Arc::new(HangingScanner),
            Arc::new(StubScanner {
                name: "fast",
                result: Ok(ScanVerdict::Clean),
            }),
        ];

        let outcome = run_scan_chain(
            &scanners,
            Path::new("/tmp/file"),
            Duration::from_millis(50),
        )
        .await;

        match outcome {
            ScanChainOutcome::Completed { backend, verdict } => {
                assert_eq!(backend, "fast");
                assert_eq!(verdict, ScanVerdict::Clean);
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }
}
