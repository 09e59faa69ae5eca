//! Bundle analysis for nectar.
//!
//! This crate reads a [`nectar_core::BundleSnapshot`] and the project sources to report:
//! - Heavy libraries duplicated across the initial JS of several routes
//! - The per-route baseline report written to `.nectar/report.md`
//! - Client components importing server-only Node built-ins

mod boundary;
mod dup_vendors;
mod report;
mod reporter;

// Re-export public API
pub use boundary::{
    Finding, SERVER_ONLY_IN_CLIENT, SERVER_ONLY_MODULES, Severity, detect_server_only_in_client,
    is_client_source,
};
pub use dup_vendors::{DupVendor, detect_duplicate_vendors};
pub use report::{REPORT_FILE, baseline_report, write_report};
pub use reporter::{print_dup_vendors, print_findings_tree};
