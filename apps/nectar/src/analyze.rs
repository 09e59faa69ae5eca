use anyhow::Result;
use clap::Args;
use colored::Colorize;
use log::{debug, info};
use nectar_analyze::{
    detect_duplicate_vendors, detect_server_only_in_client, print_dup_vendors, print_findings_tree,
    write_report,
};
use nectar_core::{load_config, read_bundle_snapshot};
use serde_json::json;
use std::{io::Write, path::PathBuf, time::Instant};

use crate::resolve;

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Path to a build-manifest.json (default: .next/build-manifest.json)
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Path to a sizes.json (asset path to bytes)
    #[arg(long)]
    pub sizes: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(args: &AnalyzeArgs, out: &mut W) -> Result<i32> {
    let start = Instant::now();
    let root = args.root.as_path();
    let cfg = load_config(root);

    let fixture = args.fixture.as_deref().map(|p| resolve(root, p));
    let sizes = args.sizes.as_deref().map(|p| resolve(root, p));
    let Some(snapshot) = read_bundle_snapshot(root, fixture.as_deref(), sizes.as_deref()) else {
        writeln!(out, "{}", "No manifest found.".yellow())?;
        return Ok(0);
    };

    let num_threads = rayon::current_num_threads();
    info!("Analyzing {} routes (using {} threads)", snapshot.routes.len(), num_threads);

    let dups = detect_duplicate_vendors(&snapshot, &cfg.heavy_deps);
    let report_path = write_report(root, &snapshot, &dups)?;
    let findings = detect_server_only_in_client(root);
    debug!("{} duplicate vendors, {} boundary findings", dups.len(), findings.len());

    if args.json {
        let v = json!({ "snapshot": snapshot, "dupVendors": dups, "findings": findings });
        writeln!(out, "{}", serde_json::to_string_pretty(&v)?)?;
        return Ok(0);
    }

    writeln!(out, "{}", format!("Wrote report: {}", report_path.display()).green())?;
    print_dup_vendors(out, &dups)?;
    print_findings_tree(out, &findings, root)?;
    writeln!(
        out,
        "\n{} Finished in {}ms on {} routes (using {} threads).",
        "●".bright_blue(),
        start.elapsed().as_millis().to_string().cyan(),
        snapshot.routes.len().to_string().cyan(),
        num_threads.to_string().cyan()
    )?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn args(root: &Path, json: bool) -> AnalyzeArgs {
        AnalyzeArgs {
            root: root.to_path_buf(),
            fixture: Some(PathBuf::from("manifest.json")),
            sizes: Some(PathBuf::from("sizes.json")),
            json,
        }
    }

    #[test]
    fn test_missing_manifest_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        assert_eq!(run(&args(temp.path(), false), &mut out).unwrap(), 0);
        assert!(String::from_utf8_lossy(&out).contains("No manifest found."));
        assert!(!temp.path().join(".nectar").exists());
    }

    #[test]
    fn test_json_output() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "nectar.config.json", r#"{ "heavyDeps": ["chart.js"] }"#);
        create_test_file(
            temp.path(),
            "manifest.json",
            r#"{ "pages": { "/": ["static/chunks/chart.js-a.js"], "/admin": ["static/chunks/chart.js-a.js", "static/chunks/main.js"] } }"#,
        );
        create_test_file(
            temp.path(),
            "sizes.json",
            r#"{ "static/chunks/chart.js-a.js": 102400, "static/chunks/main.js": 102400 }"#,
        );
        create_test_file(temp.path(), "src/components/Fs.tsx", "'use client';\nimport fs from 'fs';\nexport default fs;\n");

        let mut out = Vec::new();
        assert_eq!(run(&args(temp.path(), true), &mut out).unwrap(), 0);
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(v["snapshot"]["routes"].as_array().unwrap().len(), 2);
        assert_eq!(v["dupVendors"][0]["lib"], "chart.js");
        assert_eq!(v["dupVendors"][0]["count"], 2);
        assert_eq!(v["dupVendors"][0]["approxKB"], 200.0);
        assert_eq!(v["findings"][0]["module"], "fs");
        assert!(temp.path().join(".nectar/report.md").is_file());
    }
}
