//! StreamVault content safety
//!
//! Layered inspection of staged uploads: size and declared-type checks,
//! magic-byte signature screening, and a pluggable chain of malware-scan
//! backends. The inspector reports every failing check at once; scan-backend
//! unavailability degrades to a warning so uploads are never blocked by scan
//! infrastructure being down.

mod inspector;
mod report;
pub mod scan;
pub mod signatures;

pub use inspector::{ContentInspector, InspectorConfig};
pub use report::{ChecksPerformed, InspectionReport};
pub use scan::{run_scan_chain, ScanChainOutcome, ScanError, ScanVerdict, Scanner};
