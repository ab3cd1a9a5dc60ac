//! Local ClamAV daemon backend.

use super::{ScanError, ScanVerdict, Scanner};
use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use std::path::Path;
use std::str;

pub struct ClamAvScanner {
    host: String,
    port: u16,
}

impl ClamAvScanner {
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }
}

#[async_trait]
impl Scanner for ClamAvScanner {
    fn name(&self) -> &'static str {
        "clamav"
    }

    /// Scan using the sync client inside spawn_blocking to avoid !Send tokio futures.
    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScanError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ScanError(format!("Cannot read file for scanning: {}", e)))?;

        let host = self.host.clone();
        let port = self.port;

        let result = tokio::task::spawn_blocking(move || {
            let address = format!("{}:{}", host, port);
            let connection = Tcp {
                host_address: address.as_str(),
            };
            let response_bytes = clamav_client::scan_buffer(data.as_slice(), connection, None)
                .map_err(|e| ScanError(format!("ClamAV scan error: {}", e)))?;

            let is_clean = clean(&response_bytes)
                .map_err(|e| ScanError(format!("Failed to parse ClamAV response: {}", e)))?;

            if is_clean {
                return Ok(ScanVerdict::Clean);
            }

            let response_str = str::from_utf8(&response_bytes)
                .map(|s| s.trim())
                .unwrap_or("unknown");
            let virus_name = if response_str.contains("FOUND") {
                response_str
                    .split(':')
                    .nth(1)
                    .unwrap_or("unknown")
                    .split_whitespace()
                    .next()
                    .unwrap_or("unknown")
                    .to_string()
            } else {
                "unknown".to_string()
            };

            Ok(ScanVerdict::Infected(virus_name))
        })
        .await
        .map_err(|e| ScanError(format!("ClamAV scan task join error: {}", e)))?;

        match &result {
            Ok(ScanVerdict::Clean) => tracing::debug!("ClamAV scan completed: clean"),
            Ok(ScanVerdict::Infected(virus)) => {
                tracing::warn!(virus = %virus, "ClamAV scan detected virus")
            }
            Err(e) => tracing::warn!(error = %e, "ClamAV scan failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamav_constructor() {
        let scanner = ClamAvScanner::new("localhost".to_string(), 3310);
        assert_eq!(scanner.name(), "clamav");
    }
}
