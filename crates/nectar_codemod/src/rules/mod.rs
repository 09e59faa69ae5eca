//! Detectors and transforms, one submodule per rule.

pub mod dynamic_heavy;
pub mod star_import;
mod text;

use log::{debug, info};
use nectar_core::{SourceFile, load_sources};

use crate::{
    context::CodemodContext,
    types::{RuleKind, Suggestion, SuggestionData, TransformOutcome},
};
use dynamic_heavy::DynamicHeavyDetector;
use star_import::StarImportDetector;

/// Finds rewrite opportunities of one rule in a single file. Never mutates anything.
pub trait Detector {
    fn rule(&self) -> RuleKind;
    fn detect(&self, file: &SourceFile) -> Vec<Suggestion>;
}

/// Scan the project and return suggestions of every enabled rule.
///
/// `only_rule` narrows discovery to a single rule on top of the config toggles.
pub fn discover(ctx: &CodemodContext, only_rule: Option<RuleKind>) -> Vec<Suggestion> {
    if ctx.heavy_deps.is_empty() {
        info!("No heavy dependencies configured; nothing to detect");
        return Vec::new();
    }
    let files = load_sources(&ctx.root);
    discover_in(ctx, &files, only_rule)
}

/// Run the enabled detectors over already loaded files.
///
/// Every file is scanned by the star-import detector first, then by the
/// dynamic detector, so suggestions of one rule stay contiguous.
pub fn discover_in(
    ctx: &CodemodContext,
    files: &[SourceFile],
    only_rule: Option<RuleKind>,
) -> Vec<Suggestion> {
    if ctx.heavy_deps.is_empty() {
        return Vec::new();
    }
    let wanted = |rule: RuleKind| only_rule.is_none_or(|r| r == rule);

    let mut detectors: Vec<Box<dyn Detector + '_>> = Vec::new();
    if ctx.star_import_enabled && wanted(RuleKind::StarImportSlimming) {
        detectors.push(Box::new(StarImportDetector::new(&ctx.heavy_deps)));
    }
    if ctx.dynamic_enabled && wanted(RuleKind::DynamicHeavyDep) {
        detectors.push(Box::new(DynamicHeavyDetector::new(&ctx.heavy_deps, &ctx.dynamic_allowlist)));
    }

    let mut out = Vec::new();
    for detector in &detectors {
        let before = out.len();
        for file in files {
            out.extend(detector.detect(file));
        }
        debug!("{} found {} suggestions", detector.rule(), out.len() - before);
    }
    out
}

/// Dispatch to the pure transform of the suggestion's rule.
pub fn transform(content: &str, data: &SuggestionData) -> TransformOutcome {
    match data {
        SuggestionData::StarImport(d) => star_import::transform(content, d),
        SuggestionData::DynamicHeavyDep(d) => dynamic_heavy::transform(content, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nectar_core::NectarConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(heavy: &[&str]) -> NectarConfig {
        NectarConfig { heavy_deps: heavy.iter().map(|s| s.to_string()).collect(), ..Default::default() }
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        create_test_file(
            temp.path(),
            "src/pages/date.tsx",
            "import * as dateFns from 'date-fns';\nexport default () => dateFns.format(new Date(), 'y');\n",
        );
        create_test_file(
            temp.path(),
            "src/components/Chart.tsx",
            "import Chart from 'chart.js';\nexport const C = () => String(Chart);\n",
        );
        temp
    }

    #[test]
    fn test_discover_runs_star_rule_first() {
        let temp = fixture();
        let ctx = CodemodContext::new(temp.path(), &config(&["date-fns", "chart.js"]));
        let found = discover(&ctx, None);
        let kinds: Vec<RuleKind> = found.iter().map(Suggestion::kind).collect();
        assert_eq!(kinds, vec![RuleKind::StarImportSlimming, RuleKind::DynamicHeavyDep]);
        assert_eq!(found[0].file, "src/pages/date.tsx");
        assert_eq!(found[1].file, "src/components/Chart.tsx");
    }

    #[test]
    fn test_discover_without_heavy_deps_is_empty() {
        let temp = fixture();
        let ctx = CodemodContext::new(temp.path(), &config(&[]));
        assert!(discover(&ctx, None).is_empty());
    }

    #[test]
    fn test_discover_honors_rule_filter_and_toggles() {
        let temp = fixture();
        let ctx = CodemodContext::new(temp.path(), &config(&["date-fns", "chart.js"]));
        let only = discover(&ctx, Some(RuleKind::DynamicHeavyDep));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].kind(), RuleKind::DynamicHeavyDep);

        let mut cfg = config(&["date-fns", "chart.js"]);
        cfg.rules.dynamic_heavy_dep = Some(false);
        let ctx = CodemodContext::new(temp.path(), &cfg);
        let found = discover(&ctx, None);
        assert!(found.iter().all(|s| s.kind() == RuleKind::StarImportSlimming));
    }

    #[test]
    fn test_named_import_yields_no_suggestions() {
        let temp = TempDir::new().unwrap();
        create_test_file(
            temp.path(),
            "src/pages/date.tsx",
            "import { format } from 'date-fns'; export default format(new Date(),'y')",
        );
        let ctx = CodemodContext::new(temp.path(), &config(&["date-fns"]));
        assert!(discover(&ctx, None).is_empty());
    }
}
