use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::{id::suggestion_id, types::Suggestion};

pub const PLAN_FILE: &str = "plan.json";

/// A ranked and identified suggestion as persisted in `plan.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Empty only for legacy plans; filled by [`read_plan`]
    #[serde(default)]
    pub id: String,
    #[serde(rename = "estimatedKB", default)]
    pub estimated_kb: f64,
    #[serde(flatten)]
    pub suggestion: Suggestion,
}

impl PlanItem {
    pub fn new(suggestion: Suggestion, estimated_kb: f64) -> Self {
        Self { id: suggestion_id(&suggestion), estimated_kb, suggestion }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub created_at: String,
    #[serde(default, alias = "plan")]
    pub items: Vec<PlanItem>,
}

/// Drop items under `min_kb`, then sort by estimate, largest first.
///
/// The sort is stable; equal estimates keep discovery order.
pub fn rank(items: Vec<PlanItem>, min_kb: f64) -> Vec<PlanItem> {
    let total = items.len();
    let mut ranked: Vec<PlanItem> = items.into_iter().filter(|i| i.estimated_kb >= min_kb).collect();
    if ranked.len() < total {
        debug!("{} suggestions below {} KB dropped", total - ranked.len(), min_kb);
    }
    ranked.sort_by(|a, b| b.estimated_kb.total_cmp(&a.estimated_kb));
    ranked
}

/// Why a selection filter produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionWarning {
    OnlyMatchedNothing,
    ExceptRemovedEverything,
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionWarning::OnlyMatchedNothing => f.write_str("No suggestions matched --only IDs."),
            SelectionWarning::ExceptRemovedEverything => {
                f.write_str("All suggestions excluded by --except.")
            }
        }
    }
}

/// Parse a comma separated id list, ignoring blanks.
pub fn parse_ids(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

/// Keep the ids in `only` (when given), then remove the ids in `except`.
pub fn select(
    items: Vec<PlanItem>,
    only: &[String],
    except: &[String],
) -> (Vec<PlanItem>, Vec<SelectionWarning>) {
    let mut warnings = Vec::new();
    let mut items = items;

    if !only.is_empty() {
        let keep: HashSet<&str> = only.iter().map(String::as_str).collect();
        items.retain(|i| keep.contains(i.id.as_str()));
        if items.is_empty() {
            warnings.push(SelectionWarning::OnlyMatchedNothing);
        }
    }
    if !except.is_empty() {
        let drop: HashSet<&str> = except.iter().map(String::as_str).collect();
        items.retain(|i| !drop.contains(i.id.as_str()));
        if items.is_empty() {
            warnings.push(SelectionWarning::ExceptRemovedEverything);
        }
    }
    (items, warnings)
}

/// Write `{out_dir}/plan.json` and return its path.
pub fn write_plan(items: &[PlanItem], out_dir: &Path) -> Result<PathBuf> {
    let plan = Plan { created_at: Utc::now().to_rfc3339(), items: items.to_vec() };
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create plan directory {}", out_dir.display()))?;
    let path = out_dir.join(PLAN_FILE);
    let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
    fs::write(&path, json).with_context(|| format!("Failed to write plan {}", path.display()))?;
    info!("Wrote plan with {} items to {}", plan.items.len(), path.display());
    Ok(path)
}

/// Read a plan, accepting the legacy `plan` array and filling in missing ids.
pub fn read_plan(path: &Path) -> Result<Plan> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    let mut plan: Plan = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse plan {}", path.display()))?;
    for item in plan.items.iter_mut().filter(|i| i.id.is_empty()) {
        item.id = suggestion_id(&item.suggestion);
    }
    debug!("Read plan with {} items from {}", plan.items.len(), path.display());
    Ok(plan)
}
