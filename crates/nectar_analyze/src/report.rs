use anyhow::{Context, Result};
use log::info;
use nectar_core::{BundleSnapshot, NECTAR_DIR};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::dup_vendors::DupVendor;

pub const REPORT_FILE: &str = "report.md";

/// Baseline markdown: initial JS per route, then duplicated vendors when there are any.
pub fn baseline_report(snap: &BundleSnapshot, dups: &[DupVendor]) -> String {
    let mut lines = vec![
        "# 🌺 nectar report (baseline)".to_string(),
        String::new(),
        "## Per-route Initial JS".to_string(),
        "| Route | Initial JS (KB) | Assets |".to_string(),
        "|-------|-----------------:|--------|".to_string(),
    ];
    for r in &snap.routes {
        lines.push(format!("| {} | {:.1} | {} |", r.path, r.initial_js_kb, r.assets.len()));
    }
    if !dups.is_empty() {
        lines.push("\n## Duplicate heavy vendors across routes".to_string());
        lines.push("| Library | Routes | Approx KB |".to_string());
        lines.push("|---------|--------|----------:|".to_string());
        for d in dups {
            lines.push(format!("| {} | {} | {:.1} |", d.lib, d.routes.join(", "), d.approx_kb));
        }
    }
    lines.join("\n")
}

/// Write the baseline report to `{root}/.nectar/report.md`.
pub fn write_report(root: &Path, snap: &BundleSnapshot, dups: &[DupVendor]) -> Result<PathBuf> {
    let dir = root.join(NECTAR_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(REPORT_FILE);
    fs::write(&path, baseline_report(snap, dups))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!("Wrote report to {}", path.display());
    Ok(path)
}
