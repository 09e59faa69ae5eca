//! Core utilities shared by the nectar tools.
//!
//! This crate provides the project-facing plumbing used by both the codemod
//! pipeline and the bundle analysis:
//! - Scanning a project for JS/TS source files
//! - Loading and validating `nectar.config.json`
//! - Reading a build manifest into a [`BundleSnapshot`]
//! - Parsing runtime import statements with oxc

mod bundle;
mod collector;
mod config;
mod constants;
mod parser;
mod types;

// Re-export public API
pub use bundle::{BundleSnapshot, RouteJs, read_bundle_snapshot};
pub use collector::{SourceFile, collect_sources, load_sources, read_source, relative_path};
pub use config::{
    NectarConfig, PagesConfig, RuleToggles, Thresholds, ValidationIssue, ValidationReport,
    load_config, validate_config_file, validate_config_value,
};
pub use constants::{
    BACKUPS_DIR, BUILD_DIR, BUILD_OUTPUT_PREFIX, CONFIG_FILE, DEFAULT_MANIFEST, JS_TS_EXTENSIONS,
    NECTAR_DIR, SKIP_DIRS,
};
pub use parser::imports_in_source;
pub use types::{SpecKind, Specifier};
