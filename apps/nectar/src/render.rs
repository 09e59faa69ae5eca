use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use log::warn;
use nectar_codemod::{
    parse_ids, read_plan, render::{comment_markdown, plan_json, summary_markdown, totals}, select,
};
use std::{fs, io::Write, path::PathBuf};

use crate::resolve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Comment,
    Summary,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = RenderFormat::Comment)]
    pub format: RenderFormat,

    /// Plan to render
    #[arg(long, default_value = ".nectar/plan.json")]
    pub plan: PathBuf,

    /// Unified diff to embed in the comment
    #[arg(long, default_value = ".nectar/diff.patch")]
    pub diff: PathBuf,

    /// Baseline report to embed in the comment
    #[arg(long, default_value = ".nectar/report.md")]
    pub report: PathBuf,

    /// Comma separated suggestion ids to include
    #[arg(long)]
    pub only: Option<String>,

    /// Comma separated suggestion ids to exclude
    #[arg(long)]
    pub except: Option<String>,

    /// Write the rendering to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Exit non-zero when the selected total KB exceeds this value
    #[arg(long)]
    pub fail_if_total_kb: Option<f64>,

    /// Exit non-zero when more than this many suggestions are selected
    #[arg(long)]
    pub fail_if_count: Option<usize>,

    /// Shorthand for `--format json`
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(args: &RenderArgs, out: &mut W) -> Result<i32> {
    let root = args.root.as_path();
    let plan = read_plan(&resolve(root, &args.plan))?;
    let (items, warnings) =
        select(plan.items, &parse_ids(args.only.as_deref()), &parse_ids(args.except.as_deref()));
    for w in &warnings {
        warn!("{}", w);
    }

    let format = if args.json { RenderFormat::Json } else { args.format };
    let rendered = match format {
        RenderFormat::Json => serde_json::to_string_pretty(&plan_json(&items))?,
        RenderFormat::Summary => summary_markdown(&items),
        RenderFormat::Comment => {
            let report = fs::read_to_string(resolve(root, &args.report)).ok();
            let diff = fs::read_to_string(resolve(root, &args.diff)).ok();
            comment_markdown(&items, report.as_deref(), diff.as_deref())
        }
    };

    match &args.out {
        Some(path) => {
            let path = resolve(root, path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, &rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "{}", format!("Wrote {}", path.display()).green())?;
        }
        None => writeln!(out, "{}", rendered)?,
    }

    let t = totals(&items);
    let mut failed = false;
    if let Some(max_kb) = args.fail_if_total_kb
        && t.total_kb > max_kb
    {
        writeln!(out, "{}", format!("Total estimated {:.1} KB exceeds {:.1} KB", t.total_kb, max_kb).red())?;
        failed = true;
    }
    if let Some(max_count) = args.fail_if_count
        && t.count > max_count
    {
        writeln!(out, "{}", format!("{} suggestions exceed the limit of {}", t.count, max_count).red())?;
        failed = true;
    }
    Ok(if failed { 1 } else { 0 })
}
