//! Transactional apply.
//!
//! One invocation goes through these steps in order:
//! 1. Keep only the suggestions that carry enough data to apply.
//! 2. For each suggestion in turn, transform the current file content. If it
//!    changed, back up the pre-image and then overwrite the file.
//! 3. If nothing was written, stop.
//! 4. Run the typecheck gate once, unless skipped.
//! 5. Keep the edits when the gate passes, otherwise restore every backed up
//!    file. The backup set stays on disk either way.

use log::{debug, info, warn};
use nectar_core::read_source;
use std::{fs, path::PathBuf};

use crate::{
    backup::{BackupSet, RollbackReport, rollback},
    context::CodemodContext,
    rules,
    typecheck::TypecheckGate,
    types::{ApplyResult, Suggestion},
};

/// Characters of gate output kept for diagnostics
pub const EXCERPT_CHARS: usize = 2000;

/// What happened after the write phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// No file was written, so there was nothing to check
    NothingApplied,
    /// Edits were kept without running the gate
    Skipped,
    Passed,
    /// Edits were rolled back
    Failed { excerpt: String, rollback: RollbackReport },
}

#[derive(Debug, Clone)]
pub struct ApplyReport {
    pub results: Vec<ApplyResult>,
    pub backup_dir: Option<PathBuf>,
    pub validation: Validation,
}

impl ApplyReport {
    pub fn applied(&self) -> impl Iterator<Item = &ApplyResult> {
        self.results.iter().filter(|r| r.applied)
    }
}

/// Apply `suggestions` as one transaction. `gate: None` keeps the edits unchecked.
pub fn apply_suggestions(
    ctx: &CodemodContext,
    suggestions: &[Suggestion],
    gate: Option<&dyn TypecheckGate>,
) -> ApplyReport {
    let staged: Vec<&Suggestion> = suggestions.iter().filter(|s| s.is_applicable()).collect();
    if staged.len() < suggestions.len() {
        debug!("{} suggestions lack data to apply", suggestions.len() - staged.len());
    }

    let mut backups = BackupSet::new(&ctx.backups_root);
    let results: Vec<ApplyResult> = staged.into_iter().filter_map(|s| apply_one(ctx, s, &mut backups)).collect();
    let backup_dir = backups.dir().map(PathBuf::from);

    let applied = results.iter().filter(|r| r.applied).count();
    let validation = if applied == 0 {
        info!("No file edits were applied; nothing to typecheck");
        Validation::NothingApplied
    } else if let Some(gate) = gate {
        info!("Validating {} edited files", applied);
        let report = gate.run(&ctx.root);
        if report.ok {
            Validation::Passed
        } else {
            warn!("Typecheck failed; reverting {} edited files", applied);
            Validation::Failed { excerpt: excerpt(&report.output), rollback: rollback(&ctx.root, &results) }
        }
    } else {
        info!("Typecheck skipped; keeping {} edited files", applied);
        Validation::Skipped
    };

    ApplyReport { results, backup_dir, validation }
}

/// Returns `None` when the file cannot be read.
fn apply_one(ctx: &CodemodContext, s: &Suggestion, backups: &mut BackupSet) -> Option<ApplyResult> {
    let path = ctx.root.join(&s.file);
    let before = read_source(&path)?;

    let outcome = rules::transform(&before, &s.data);
    if !outcome.changed {
        let reason = outcome.reason.unwrap_or_else(|| "No textual change produced".to_string());
        debug!("{}: {}", s.file, reason);
        return Some(ApplyResult::skipped(&s.file, reason));
    }

    let backup = match backups.store(&s.file, &before) {
        Ok(p) => p,
        Err(e) => {
            warn!("Not editing {}: {:#}", s.file, e);
            return Some(ApplyResult::skipped(&s.file, format!("{:#}", e)));
        }
    };

    if let Err(e) = fs::write(&path, &outcome.after) {
        warn!("Failed to write {}: {}", path.display(), e);
        return Some(ApplyResult {
            file: s.file.clone(),
            applied: false,
            reason: Some(format!("Failed to write {}: {}", s.file, e)),
            bytes_delta: None,
            backups_path: Some(backup),
        });
    }

    let delta = outcome.after.len() as i64 - before.len() as i64;
    info!("Applied {} to {} ({:+} bytes)", s.kind(), s.file, delta);
    Some(ApplyResult {
        file: s.file.clone(),
        applied: true,
        reason: None,
        bytes_delta: Some(delta),
        backups_path: Some(backup),
    })
}

fn excerpt(output: &str) -> String {
    output.chars().take(EXCERPT_CHARS).collect()
}
