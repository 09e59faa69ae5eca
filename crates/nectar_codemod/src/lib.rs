//! The nectar codemod pipeline.
//!
//! Suggestions flow from the detectors through impact estimation and identity
//! into a [`Plan`], which is then either previewed as unified diffs or applied
//! as one transaction that is rolled back when the typecheck gate fails.
//!
//! # Examples
//!
//! ```no_run
//! use nectar_codemod::{CodemodContext, TscGate, apply_suggestions, discover, estimate_impact, rank};
//! use nectar_core::{load_config, read_bundle_snapshot};
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/project");
//! let ctx = CodemodContext::new(root, &load_config(root));
//! let snapshot = read_bundle_snapshot(root, None, None);
//! let items = rank(estimate_impact(snapshot.as_ref(), discover(&ctx, None)), 0.0);
//!
//! let selected: Vec<_> = items.into_iter().map(|i| i.suggestion).collect();
//! let report = apply_suggestions(&ctx, &selected, Some(&TscGate));
//! println!("{:?}", report.validation);
//! ```

mod apply;
mod backup;
mod context;
mod id;
mod impact;
mod plan;
mod preview;
pub mod render;
pub mod rules;
mod typecheck;
mod types;

// Re-export public API
pub use apply::{ApplyReport, EXCERPT_CHARS, Validation, apply_suggestions};
pub use backup::{
    BackupSet, RestoreOutcome, RollbackReport, decode_backup_path, encode_backup_path,
    restore_latest, rollback, timestamp_key,
};
pub use context::CodemodContext;
pub use id::{ID_LEN, suggestion_id};
pub use impact::{estimate_impact, estimate_kb};
pub use plan::{
    PLAN_FILE, Plan, PlanItem, SelectionWarning, parse_ids, rank, read_plan, select, write_plan,
};
pub use preview::{FileDiff, join_diffs, preview_diffs, unified_diff};
pub use rules::{Detector, discover, discover_in, transform};
pub use typecheck::{GateReport, TscGate, TypecheckGate};
pub use types::{
    ApplyResult, DynamicImportData, RuleKind, StarImportData, Suggestion, SuggestionData,
    TransformOutcome,
};
