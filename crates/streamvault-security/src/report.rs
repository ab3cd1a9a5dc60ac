//! Inspection report types.

use serde::Serialize;
use utoipa::ToSchema;

/// Which checks actually ran. A check that could not run (e.g. every scan
/// backend unreachable) stays `false` and is reported as a warning instead
/// of blocking the upload.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct ChecksPerformed {
    pub file_size: bool,
    pub mime_type: bool,
    pub file_signature: bool,
    pub virus_scan: bool,
}

/// The immutable verdict for one staged file.
///
/// `errors` is non-empty iff `valid` is false. `warnings` are advisory and
/// never block an upload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InspectionReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub checks: ChecksPerformed,
}

impl InspectionReport {
    pub(crate) fn new() -> Self {
        InspectionReport {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            checks: ChecksPerformed::default(),
        }
    }

    pub(crate) fn add_error(&mut self, error: impl Into<String>) {
        self.valid = false;
        self.errors.push(error.into());
    }

    pub(crate) fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_flip_validity_warnings_do_not() {
        let mut report = InspectionReport::new();
        assert!(report.valid);

        report.add_warning("Virus scan unavailable");
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);

        report.add_error("File is empty");
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
    }
}
