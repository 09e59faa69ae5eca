use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use log::{debug, info};
use nectar_codemod::{
    CodemodContext, PlanItem, RuleKind, Suggestion, TscGate, TypecheckGate, Validation,
    apply_suggestions, discover, estimate_impact, join_diffs, parse_ids, preview_diffs, rank,
    read_plan, select, write_plan,
};
use nectar_core::{load_config, read_bundle_snapshot};
use serde_json::json;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::resolve;

/// Suggestions listed after discovery
const TOP_SHOWN: usize = 10;

#[derive(Debug, Clone, Args)]
pub struct CodemodArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Apply changes instead of only planning
    #[arg(long)]
    pub apply: bool,

    /// Only run one rule
    #[arg(long, value_enum)]
    pub rule: Option<RuleKind>,

    /// Use an existing plan.json instead of discovery
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Directory for artifacts such as plan.json
    #[arg(long, default_value = ".nectar")]
    pub out: PathBuf,

    /// Path to a build-manifest.json for impact estimation
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Path to a sizes.json (asset path to bytes) for impact estimation
    #[arg(long)]
    pub sizes: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,

    /// Keep only the top N suggestions by estimated KB
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write unified diffs of the selected suggestions instead of applying
    #[arg(long)]
    pub diff: bool,

    /// Where to write the unified diff
    #[arg(long, default_value = ".nectar/diff.patch")]
    pub diff_out: PathBuf,

    /// Comma separated suggestion ids to include
    #[arg(long)]
    pub only: Option<String>,

    /// Comma separated suggestion ids to exclude
    #[arg(long)]
    pub except: Option<String>,

    /// Keep applied edits without running `tsc --noEmit`
    #[arg(long)]
    pub no_typecheck: bool,
}

pub fn run<W: Write>(args: &CodemodArgs, out: &mut W) -> Result<i32> {
    let root = args.root.as_path();
    let cfg = load_config(root);
    let ctx = CodemodContext::new(root, &cfg);
    let only = parse_ids(args.only.as_deref());
    let except = parse_ids(args.except.as_deref());

    let items = match &args.plan {
        Some(plan_path) => {
            let plan = read_plan(&resolve(root, plan_path))?;
            let (items, warnings) = select(plan.items, &only, &except);
            for w in warnings {
                writeln!(out, "{}", w.to_string().yellow())?;
            }
            items
        }
        None => {
            let items = plan_from_discovery(args, &ctx, cfg.min_estimated_kb(), &only, &except, out)?;
            let plan_path = write_plan(&items, &resolve(root, &args.out))?;
            if args.json && !args.diff && !args.apply {
                writeln!(out, "{}", serde_json::to_string_pretty(&json!({ "plan": items }))?)?;
                return Ok(0);
            }
            if !args.json {
                writeln!(out, "{}", format!("Wrote plan: {}", plan_path.display()).green())?;
                print_top(out, &items)?;
            }
            items
        }
    };

    let suggestions: Vec<Suggestion> = items.iter().map(|i| i.suggestion.clone()).collect();

    if args.diff && !args.apply {
        let diff_out = resolve(root, &args.diff_out);
        write_diff(&ctx, &suggestions, &diff_out)?;
        writeln!(out, "{}", format!("Wrote dry diff: {}", diff_out.display()).green())?;
        if args.json {
            let v = json!({ "plan": items, "diffOut": diff_out });
            writeln!(out, "{}", serde_json::to_string_pretty(&v)?)?;
        }
        return Ok(0);
    }

    if suggestions.is_empty() && (args.diff || args.apply) {
        writeln!(out, "{}", "No suggestions available for this operation.".yellow())?;
        return Ok(0);
    }
    if !args.apply {
        return Ok(0);
    }

    apply(args, &ctx, &suggestions, out)
}

/// Discovery, impact, threshold, ranking, selection and limit, in that order.
fn plan_from_discovery<W: Write>(
    args: &CodemodArgs,
    ctx: &CodemodContext,
    min_kb: f64,
    only: &[String],
    except: &[String],
    out: &mut W,
) -> Result<Vec<PlanItem>> {
    let found = discover(ctx, args.rule);
    info!("Discovered {} suggestions", found.len());

    let fixture = args.fixture.as_deref().map(|p| resolve(&ctx.root, p));
    let sizes = args.sizes.as_deref().map(|p| resolve(&ctx.root, p));
    let snapshot = read_bundle_snapshot(&ctx.root, fixture.as_deref(), sizes.as_deref());

    let ranked = rank(estimate_impact(snapshot.as_ref(), found), min_kb);
    let (mut items, warnings) = select(ranked, only, except);
    for w in warnings {
        writeln!(out, "{}", w.to_string().yellow())?;
    }
    if let Some(limit) = args.limit.filter(|l| *l > 0) {
        items.truncate(limit);
    }
    debug!("Planned {} suggestions", items.len());
    Ok(items)
}

fn print_top<W: Write>(out: &mut W, items: &[PlanItem]) -> Result<()> {
    writeln!(out, "{}", "\nTop suggestions by estimated KB:".cyan())?;
    for item in items.iter().take(TOP_SHOWN) {
        let s = &item.suggestion;
        writeln!(
            out,
            "  - {} {} ~{} KB  @ {}  [{}]",
            s.kind(),
            s.target().bold(),
            item.estimated_kb,
            s.file,
            item.id
        )?;
    }
    Ok(())
}

fn write_diff(ctx: &CodemodContext, suggestions: &[Suggestion], path: &Path) -> Result<()> {
    let patch = join_diffs(&preview_diffs(ctx, suggestions));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, patch).with_context(|| format!("Failed to write diff {}", path.display()))
}

fn apply<W: Write>(
    args: &CodemodArgs,
    ctx: &CodemodContext,
    suggestions: &[Suggestion],
    out: &mut W,
) -> Result<i32> {
    writeln!(out, "{}", format!("\nApplying {} suggestions…", suggestions.len()).cyan())?;
    let gate: Option<&dyn TypecheckGate> = if args.no_typecheck { None } else { Some(&TscGate) };
    if gate.is_some() {
        writeln!(out, "{}", "Edits are validated with tsc --noEmit once written.".dimmed())?;
    }
    let report = apply_suggestions(ctx, suggestions, gate);

    if args.json {
        let validation = match &report.validation {
            Validation::NothingApplied => json!({ "status": "nothing-applied" }),
            Validation::Skipped => json!({ "status": "skipped" }),
            Validation::Passed => json!({ "status": "passed" }),
            Validation::Failed { excerpt, rollback } => json!({
                "status": "failed",
                "excerpt": excerpt,
                "restored": rollback.restored,
                "restoreFailures": rollback.failures,
            }),
        };
        let v = json!({ "results": report.results, "backupDir": report.backup_dir, "validation": validation });
        writeln!(out, "{}", serde_json::to_string_pretty(&v)?)?;
    } else {
        for r in &report.results {
            if r.applied {
                writeln!(out, "  {} {} ({:+} bytes)", "✓".green(), r.file, r.bytes_delta.unwrap_or(0))?;
            } else {
                writeln!(out, "  {} {}: {}", "•".yellow(), r.file, r.reason.as_deref().unwrap_or(""))?;
            }
        }
    }

    match &report.validation {
        Validation::NothingApplied => {
            writeln!(out, "{}", "No file edits were applied; nothing to typecheck.".yellow())?;
            Ok(0)
        }
        Validation::Skipped => {
            writeln!(out, "{}", "Skipping typecheck by request (--no-typecheck). Edits kept.".yellow())?;
            Ok(0)
        }
        Validation::Passed => {
            writeln!(out, "{}", "Typecheck passed. Edits kept.".green())?;
            Ok(0)
        }
        Validation::Failed { excerpt, rollback } => {
            writeln!(out, "{}", "Typecheck failed. Reverting all edits.".red())?;
            writeln!(out, "{}", format!("Reverted {} files.", rollback.restored).yellow())?;
            for (file, err) in &rollback.failures {
                writeln!(out, "  {} {}: {}", "✗".red(), file, err)?;
            }
            if let Some(dir) = &report.backup_dir {
                writeln!(out, "Backups kept in {}", dir.display())?;
            }
            if !args.json {
                writeln!(out, "{}", excerpt)?;
            }
            Ok(1)
        }
    }
}
