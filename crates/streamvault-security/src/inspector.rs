//! Content inspector
//!
//! Decides, before any bytes are trusted into durable storage, whether a
//! staged file is safe and well-formed. A bad file is communicated through
//! the report (`valid = false`); only environment errors (unreadable path)
//! propagate as `Err`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use streamvault_core::AppError;
use tokio::io::AsyncReadExt;

use crate::report::InspectionReport;
use crate::scan::{run_scan_chain, ScanChainOutcome, ScanVerdict, Scanner};
use crate::signatures::{find_script_marker, match_dangerous_signature, SIGNATURE_PREFIX_LEN};

/// Per-file-class inspection settings. Each upload class (video, thumbnail,
/// caption) gets its own inspector with its own limit and allow-list.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

pub struct ContentInspector {
    config: InspectorConfig,
    scanners: Vec<Arc<dyn Scanner>>,
    scan_timeout: Duration,
}

impl ContentInspector {
    pub fn new(
        config: InspectorConfig,
        scanners: Vec<Arc<dyn Scanner>>,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            config,
            scanners,
            scan_timeout,
        }
    }

    /// Run all checks against a staged file.
    ///
    /// Checks run independently so one failure does not suppress detection of
    /// others; every failing check's error lands in the report.
    pub async fn inspect(
        &self,
        path: &Path,
        declared_name: &str,
        declared_mime: Option<&str>,
    ) -> Result<InspectionReport, AppError> {
        let mut report = InspectionReport::new();

        tracing::debug!(filename = %declared_name, "Starting security checks");

        // 1. File size
        let file_size = self.check_file_size(path, &mut report).await?;

        // 2. Declared MIME type (pure string comparison, no content inspection)
        self.check_mime_type(declared_mime, &mut report);

        // 3. Magic-byte signature + embedded script markers
        self.check_file_signature(path, &mut report).await?;

        // 4. Malware scan (best-effort; unavailability is a warning, a
        //    positive verdict is a hard reject)
        self.run_scan(path, &mut report).await;

        tracing::info!(
            filename = %declared_name,
            valid = report.valid,
            file_size = file_size,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Security check completed"
        );

        Ok(report)
    }

    async fn check_file_size(
        &self,
        path: &Path,
        report: &mut InspectionReport,
    ) -> Result<u64, AppError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot access staged file: {}", e)))?;
        let file_size = metadata.len();
        report.checks.file_size = true;

        if file_size == 0 {
            report.add_error("File is empty");
        } else if file_size > self.config.max_file_size_bytes {
            report.add_error(format!(
                "File size ({}) exceeds maximum allowed size ({})",
                format_bytes(file_size),
                format_bytes(self.config.max_file_size_bytes)
            ));
        }

        Ok(file_size)
    }

    fn check_mime_type(&self, declared_mime: Option<&str>, report: &mut InspectionReport) {
        report.checks.mime_type = true;

        let Some(mime) = declared_mime.filter(|m| !m.trim().is_empty()) else {
            report.add_error("MIME type is required");
            return;
        };

        let normalized = mime
            .split(';')
            .next()
            .map(|s| s.trim())
            .unwrap_or(mime)
            .to_lowercase();

        if !self
            .config
            .allowed_content_types
            .iter()
            .any(|ct| normalized == ct.to_lowercase())
        {
            report.add_error(format!(
                "Invalid file type: {}. Allowed types: {}",
                mime,
                self.config.allowed_content_types.join(", ")
            ));
        }
    }

    async fn check_file_signature(
        &self,
        path: &Path,
        report: &mut InspectionReport,
    ) -> Result<(), AppError> {
        let prefix = read_prefix(path, SIGNATURE_PREFIX_LEN)
            .await
            .map_err(|e| AppError::Internal(format!("Cannot read file signature: {}", e)))?;
        report.checks.file_signature = true;

        if let Some(desc) = match_dangerous_signature(&prefix) {
            report.add_error(format!(
                "Dangerous file signature detected: {}. This file may be malicious.",
                desc
            ));
        }

        if find_script_marker(&prefix).is_some() {
            report.add_error(
                "Suspicious code detected in file. File may contain malicious content.",
            );
        }

        Ok(())
    }

    async fn run_scan(&self, path: &Path, report: &mut InspectionReport) {
        if self.scanners.is_empty() {
            report.add_warning("Virus scan unavailable: no scan backends configured");
            return;
        }

        match run_scan_chain(&self.scanners, path, self.scan_timeout).await {
            ScanChainOutcome::Completed { backend, verdict } => {
                report.checks.virus_scan = true;
                match verdict {
                    ScanVerdict::Clean => {
                        tracing::debug!(backend = backend, "Malware scan clean");
                    }
                    ScanVerdict::Infected(detail) => {
                        tracing::warn!(backend = backend, detail = %detail, "Malware detected");
                        report.add_error(format!("Malware detected: {}", detail));
                    }
                }
            }
            ScanChainOutcome::Unavailable { failures } => {
                report.add_warning(format!("Virus scan unavailable: {}", failures.join("; ")));
            }
        }
    }
}

/// Read up to `len` leading bytes of a file.
async fn read_prefix(path: &Path, len: usize) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buffer = vec![0u8; len];
    let mut read = 0;
    while read < buffer.len() {
        let n = file.read(&mut buffer[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }
    buffer.truncate(read);
    Ok(buffer)
}

/// Human-readable byte count for error messages.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 bytes".to_string();
    }
    let exponent = (bytes as f64).log(1024.0).floor().min(3.0) as usize;
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    if exponent == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[exponent])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanError;
    use async_trait::async_trait;
    use std::io::Write;

    struct StubScanner {
        result: Result<ScanVerdict, String>,
    }

    #[async_trait]
    impl Scanner for StubScanner {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn scan(&self, _path: &Path) -> Result<ScanVerdict, ScanError> {
            self.result.clone().map_err(ScanError)
        }
    }

    fn video_config(max_size: u64) -> InspectorConfig {
        InspectorConfig {
            max_file_size_bytes: max_size,
            allowed_content_types: vec!["video/mp4".to_string(), "video/webm".to_string()],
        }
    }

    fn inspector(max_size: u64, scanners: Vec<Arc<dyn Scanner>>) -> ContentInspector {
        ContentInspector::new(video_config(max_size), scanners, Duration::from_secs(5))
    }

    fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let file = write_temp(b"");
        let report = inspector(1024, vec![])
            .inspect(file.path(), "empty.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("empty")));
        assert!(report.checks.file_size);
    }

    #[tokio::test]
    async fn size_boundary_is_inclusive() {
        let at_limit = write_temp(&vec![0u8; 64]);
        let report = inspector(64, vec![])
            .inspect(at_limit.path(), "ok.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(report.valid);

        let over_limit = write_temp(&vec![0u8; 65]);
        let report = inspector(64, vec![])
            .inspect(over_limit.path(), "big.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("exceeds maximum")));
    }

    #[tokio::test]
    async fn executable_signature_rejected_despite_valid_mime() {
        let file = write_temp(b"MZ\x90\x00\x03rest of a pe header");
        let report = inspector(1024, vec![])
            .inspect(file.path(), "movie.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(!report.valid);
        assert!(report.checks.file_signature);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Windows executable")));
    }

    #[tokio::test]
    async fn missing_mime_type_is_rejected() {
        let file = write_temp(b"\x00\x00\x00\x18ftypmp42");
        let report = inspector(1024, vec![])
            .inspect(file.path(), "movie.mp4", None)
            .await
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("MIME type")));
    }

    #[tokio::test]
    async fn mime_parameters_are_stripped_before_comparison() {
        let file = write_temp(b"\x00\x00\x00\x18ftypmp42");
        let report = inspector(1024, vec![])
            .inspect(file.path(), "movie.mp4", Some("video/mp4; codecs=avc1"))
            .await
            .unwrap();
        assert!(report.valid);
    }

    #[tokio::test]
    async fn failing_checks_are_all_reported() {
        let file = write_temp(b"MZ\x90\x00");
        let report = inspector(1024, vec![])
            .inspect(file.path(), "strange.bin", Some("application/zip"))
            .await
            .unwrap();
        assert!(!report.valid);
        // Both the MIME failure and the signature failure are present.
        assert_eq!(report.errors.len(), 2);
    }

    #[tokio::test]
    async fn scan_unavailable_is_a_warning_not_an_error() {
        let scanners: Vec<Arc<dyn Scanner>> = vec![
            Arc::new(StubScanner {
                result: Err("connection refused".to_string()),
            }),
            Arc::new(StubScanner {
                result: Err("dns failure".to_string()),
            }),
        ];
        let file = write_temp(b"\x00\x00\x00\x18ftypmp42");
        let report = inspector(1024, scanners)
            .inspect(file.path(), "movie.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(report.valid);
        assert!(!report.checks.virus_scan);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("Virus scan unavailable")));
    }

    #[tokio::test]
    async fn positive_scan_verdict_overrides_passing_checks() {
        let scanners: Vec<Arc<dyn Scanner>> = vec![Arc::new(StubScanner {
            result: Ok(ScanVerdict::Infected("Eicar-Test-Signature".to_string())),
        })];
        let file = write_temp(b"\x00\x00\x00\x18ftypmp42");
        let report = inspector(1024, scanners)
            .inspect(file.path(), "movie.mp4", Some("video/mp4"))
            .await
            .unwrap();
        assert!(!report.valid);
        assert!(report.checks.virus_scan);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Malware detected: Eicar-Test-Signature")));
    }

    #[tokio::test]
    async fn unreadable_path_is_an_environment_error() {
        let result = inspector(1024, vec![])
            .inspect(Path::new("/nonexistent/file.mp4"), "f.mp4", Some("video/mp4"))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn format_bytes_is_human_readable() {
        assert_eq!(format_bytes(0), "0 bytes");
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(500 * 1024 * 1024), "500.00 MB");
    }
}
