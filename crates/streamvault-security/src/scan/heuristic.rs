//! Last-resort heuristic backend: keyword scan over the file's leading bytes.
//!
//! Always available, so a fully configured chain never reports the scan as
//! unavailable.

use super::{ScanError, ScanVerdict, Scanner};
use async_trait::async_trait;
use regex::RegexSet;
use std::path::Path;
use tokio::io::AsyncReadExt;

const HEURISTIC_PREFIX_LEN: usize = 1024;

const SUSPICIOUS_PATTERNS: &[&str] = &[
    r"eval\s*\(",
    r"base64",
    r"cmd\.exe",
    r"powershell",
    r"DROP TABLE",
    r"xp_cmdshell",
];

pub struct HeuristicScanner {
    patterns: RegexSet,
}

impl Default for HeuristicScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicScanner {
    pub fn new() -> Self {
        let case_insensitive: Vec<String> = SUSPICIOUS_PATTERNS
            .iter()
            .map(|p| format!("(?i){}", p))
            .collect();
        Self {
            // Patterns are compile-time constants; construction cannot fail.
            patterns: RegexSet::new(case_insensitive).expect("invalid heuristic pattern"),
        }
    }
}

#[async_trait]
impl Scanner for HeuristicScanner {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn scan(&self, path: &Path) -> Result<ScanVerdict, ScanError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ScanError(format!("Cannot open file: {}", e)))?;

        let mut buffer = vec![0u8; HEURISTIC_PREFIX_LEN];
        let mut read = 0;
        while read < buffer.len() {
            let n = file
                .read(&mut buffer[read..])
                .await
                .map_err(|e| ScanError(format!("Cannot read file: {}", e)))?;
            if n == 0 {
                break;
            }
            read += n;
        }
        buffer.truncate(read);

        let content = String::from_utf8_lossy(&buffer);
        let matches: Vec<&str> = self
            .patterns
            .matches(&content)
            .into_iter()
            .map(|i| SUSPICIOUS_PATTERNS[i])
            .collect();

        if let Some(first) = matches.first() {
            tracing::warn!(pattern = first, "Heuristic scan matched suspicious pattern");
            return Ok(ScanVerdict::Infected(format!(
                "Suspicious patterns detected (matched: {})",
                first
            )));
        }

        Ok(ScanVerdict::Clean)
    }
}
