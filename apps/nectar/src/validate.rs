use anyhow::Result;
use clap::Args;
use colored::Colorize;
use nectar_core::{CONFIG_FILE, validate_config_file};
use std::{io::Write, path::PathBuf};

use crate::resolve;

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Config file to check
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(args: &ValidateArgs, out: &mut W) -> Result<i32> {
    let path = resolve(&args.root, &args.config);
    let report = validate_config_file(&path);

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if report.ok {
        writeln!(out, "{} {} is valid.", "✓".green().bold(), path.display())?;
    } else {
        writeln!(out, "{} {} has {} issue(s):", "✗".red().bold(), path.display(), report.issues.len())?;
        for issue in &report.issues {
            writeln!(out, "  - {}: {}", issue.path.bold(), issue.message)?;
        }
    }
    Ok(if report.ok { 0 } else { 1 })
}
