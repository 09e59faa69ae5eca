//! DYNAMIC_HEAVY_DEP: a heavy default import inside a component becomes a
//! `next/dynamic` binding with SSR disabled.

use log::{debug, warn};
use nectar_core::SourceFile;
use regex::Regex;
use std::{collections::HashSet, sync::OnceLock};

use super::{
    Detector,
    text::{directive_end, line_ending},
};
use crate::types::{DynamicImportData, RuleKind, Suggestion, SuggestionData, TransformOutcome};

pub const DYNAMIC_HELPER_MODULE: &str = "next/dynamic";

static DEFAULT_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
static APP_SHELL_RE: OnceLock<Regex> = OnceLock::new();
static HELPER_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
static HELPER_DEFAULT_RE: OnceLock<Regex> = OnceLock::new();

pub struct DynamicHeavyDetector<'a> {
    heavy_deps: &'a HashSet<String>,
    allowlist: Vec<String>,
}

impl<'a> DynamicHeavyDetector<'a> {
    pub fn new(heavy_deps: &'a HashSet<String>, allowlist: &[String]) -> Self {
        Self { heavy_deps, allowlist: allowlist.iter().map(|h| h.to_lowercase()).collect() }
    }

    /// Components only, never the app shell, and only hinted files when an allowlist is set.
    fn wants(&self, rel: &str) -> bool {
        if !self.allowlist.is_empty() {
            let lower = rel.to_lowercase();
            if !self.allowlist.iter().any(|h| lower.contains(h.as_str())) {
                return false;
            }
        }
        if !rel.contains("components/") {
            return false;
        }
        let shell = APP_SHELL_RE.get_or_init(|| {
            Regex::new(r"(_app|layout)\.(t|j)sx?$").expect("app shell regex is valid")
        });
        !shell.is_match(rel)
    }
}

impl Detector for DynamicHeavyDetector<'_> {
    fn rule(&self) -> RuleKind {
        RuleKind::DynamicHeavyDep
    }

    fn detect(&self, file: &SourceFile) -> Vec<Suggestion> {
        if !self.wants(&file.rel) {
            return Vec::new();
        }
        let re = DEFAULT_IMPORT_RE.get_or_init(|| {
            Regex::new(r#"import\s+([A-Za-z_$][\w$]*)\s+from\s+["']([^"']+)["']"#)
                .expect("default import regex is valid")
        });

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut out = Vec::new();
        for caps in re.captures_iter(&file.text) {
            let (Some(local), Some(from)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let (local, from) = (local.as_str(), from.as_str());
            if !self.heavy_deps.contains(from) || !seen.insert((local, from)) {
                continue;
            }
            debug!("{}: default import {} from {} can be deferred", file.rel, local, from);

            out.push(Suggestion {
                file: file.rel.clone(),
                summary: format!("Wrap {} from '{}' with next/dynamic({{ ssr:false }})", local, from),
                diff_preview: Some(
                    [
                        format!("+ import dynamic from '{}'", DYNAMIC_HELPER_MODULE),
                        format!("- import {} from '{}'", local, from),
                        format!("+ const {} = dynamic(() => import('{}'), {{ ssr: false }})", local, from),
                    ]
                    .join("\n"),
                ),
                data: SuggestionData::DynamicHeavyDep(DynamicImportData {
                    local_name: local.to_string(),
                    from: from.to_string(),
                }),
            });
        }
        out
    }
}

/// Replace `import Local from 'from'` with a lazily loaded binding.
pub fn transform(content: &str, data: &DynamicImportData) -> TransformOutcome {
    let pattern = format!(
        r#"(?m)(^[ \t]*|;[ \t]*)import\s+{}\s+from\s+['"]{}['"][ \t]*;?[ \t]*(\r?\n)?"#,
        regex::escape(&data.local_name),
        regex::escape(&data.from)
    );
    let import_re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Cannot build default import pattern for {}: {}", data.from, e);
            return TransformOutcome::unchanged(content, "Default import pattern invalid");
        }
    };
    let Some(caps) = import_re.captures(content) else {
        return TransformOutcome::unchanged(content, "Default import not found");
    };
    let (Some(whole), Some(prefix)) = (caps.get(0), caps.get(1)) else {
        return TransformOutcome::unchanged(content, "Default import not found");
    };

    let eol = line_ending(content);
    let existing = helper_binding(content);
    let helper = existing.clone().unwrap_or_else(|| "dynamic".to_string());

    let mut after = String::with_capacity(content.len() + 96);
    after.push_str(&content[..whole.start()]);
    after.push_str(prefix.as_str());
    after.push_str(&format!(
        "const {} = {}(() => import('{}'), {{ ssr: false }})",
        data.local_name, helper, data.from
    ));
    let rest = &content[whole.end()..];
    match caps.get(2) {
        Some(nl) => after.push_str(nl.as_str()),
        // the binding has no terminator, so code sharing its line moves down
        None if !rest.is_empty() => after.push_str(eol),
        None => {}
    }
    after.push_str(rest);

    if !has_helper_import(content) {
        let at = directive_end(&after);
        after.insert_str(at, &format!("import dynamic from '{}';{}", DYNAMIC_HELPER_MODULE, eol));
    }

    TransformOutcome::from_rewrite(content, after)
}

fn has_helper_import(content: &str) -> bool {
    let re = HELPER_IMPORT_RE.get_or_init(|| {
        Regex::new(r#"from\s+['"]next/dynamic['"]"#).expect("helper import regex is valid")
    });
    re.is_match(content)
}

/// The local name an existing `import X from 'next/dynamic'` binds.
fn helper_binding(content: &str) -> Option<String> {
    let re = HELPER_DEFAULT_RE.get_or_init(|| {
        Regex::new(r#"import\s+([A-Za-z_$][\w$]*)\s+from\s+['"]next/dynamic['"]"#)
            .expect("helper default import regex is valid")
    });
    re.captures(content).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> DynamicImportData {
        DynamicImportData { local_name: "Chart".into(), from: "chart.js".into() }
    }

    fn source(rel: &str, text: &str) -> SourceFile {
        SourceFile { path: rel.into(), rel: rel.to_string(), text: text.to_string() }
    }

    fn heavy() -> HashSet<String> {
        ["chart.js".to_string()].into_iter().collect()
    }

    #[test]
    fn test_detects_heavy_default_import_in_component() {
        let heavy = heavy();
        let detector = DynamicHeavyDetector::new(&heavy, &[]);
        let found = detector.detect(&source(
            "components/Chart.tsx",
            "import Chart from 'chart.js';\nexport function ChartCard() { return <div>{String(Chart)}</div>; }\n",
        ));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].summary, "Wrap Chart from 'chart.js' with next/dynamic({ ssr:false })");
        assert_eq!(found[0].data, SuggestionData::DynamicHeavyDep(chart()));
        assert_eq!(
            found[0].diff_preview.as_deref(),
            Some("+ import dynamic from 'next/dynamic'\n- import Chart from 'chart.js'\n+ const Chart = dynamic(() => import('chart.js'), { ssr: false })")
        );
    }

    #[test]
    fn test_skips_non_components_and_app_shell() {
        let heavy = heavy();
        let detector = DynamicHeavyDetector::new(&heavy, &[]);
        let text = "import Chart from 'chart.js';";
        assert!(detector.detect(&source("src/pages/index.tsx", text)).is_empty());
        assert!(detector.detect(&source("src/components/layout.tsx", text)).is_empty());
        assert!(detector.detect(&source("src/components/_app.jsx", text)).is_empty());
        assert_eq!(detector.detect(&source("src/components/Chart.jsx", text)).len(), 1);
    }

    #[test]
    fn test_allowlist_narrows_to_hinted_files() {
        let heavy = heavy();
        let allow = vec!["CHART".to_string()];
        let detector = DynamicHeavyDetector::new(&heavy, &allow);
        let text = "import Chart from 'chart.js';";
        assert_eq!(detector.detect(&source("src/components/Chart.tsx", text)).len(), 1);
        assert!(detector.detect(&source("src/components/Table.tsx", text)).is_empty());
    }

    #[test]
    fn test_light_libraries_ignored() {
        let heavy = heavy();
        let detector = DynamicHeavyDetector::new(&heavy, &[]);
        let found = detector.detect(&source("components/A.tsx", "import React from 'react';"));
        assert!(found.is_empty());
    }

    #[test]
    fn test_transform_wraps_and_adds_helper() {
        let before = "\n      // typical heavy default import\n      import Chart from 'chart.js';\n      export function ChartCard() {\n        return <div>{String(Chart)}</div>;\n      }\n    ";
        let out = transform(before, &chart());
        assert!(out.changed);
        assert_eq!(
            out.after,
            "import dynamic from 'next/dynamic';\n\n      // typical heavy default import\n      const Chart = dynamic(() => import('chart.js'), { ssr: false })\n      export function ChartCard() {\n        return <div>{String(Chart)}</div>;\n      }\n    "
        );
    }

    #[test]
    fn test_transform_reuses_existing_helper_import() {
        let before = "\n      import dynamic from 'next/dynamic';\n      import Chart from 'chart.js';\n      export default function C(){ return <div>{String(Chart)}</div> }\n    ";
        let out = transform(before, &chart());
        assert!(out.changed);
        assert_eq!(out.after.matches("from 'next/dynamic'").count(), 1);
        assert!(out.after.contains("const Chart = dynamic(() => import('chart.js'), { ssr: false })"));
    }

    #[test]
    fn test_transform_twice_is_noop() {
        let before = "import Chart from 'chart.js';\nexport default Chart;\n";
        let first = transform(before, &chart());
        assert!(first.changed);

        let second = transform(&first.after, &chart());
        assert!(!second.changed);
        assert_eq!(second.after, first.after);
        assert_eq!(first.after.matches("import dynamic from 'next/dynamic'").count(), 1);
        assert_eq!(first.after.matches("const Chart = dynamic(").count(), 1);
    }

    #[test]
    fn test_transform_default_import_not_found() {
        let before = "import dynamic from 'next/dynamic'; export const X=()=>null;";
        let out = transform(before, &chart());
        assert!(!out.changed);
        assert_eq!(out.after, before);
        assert_eq!(out.reason.as_deref(), Some("Default import not found"));
    }

    #[test]
    fn test_transform_places_helper_after_use_client() {
        let before = "'use client';\r\nimport Chart from 'chart.js';\r\nexport default Chart;\r\n";
        let out = transform(before, &chart());
        assert_eq!(
            out.after,
            "'use client';\r\nimport dynamic from 'next/dynamic';\r\nconst Chart = dynamic(() => import('chart.js'), { ssr: false })\r\nexport default Chart;\r\n"
        );
    }

    #[test]
    fn test_transform_keeps_use_client_below_header_comment() {
        let before = "// Copyright header\n'use client';\nimport Chart from 'chart.js';\nexport default Chart;\n";
        let out = transform(before, &chart());
        assert_eq!(
            out.after,
            "// Copyright header\n'use client';\nimport dynamic from 'next/dynamic';\nconst Chart = dynamic(() => import('chart.js'), { ssr: false })\nexport default Chart;\n"
        );
    }

    #[test]
    fn test_transform_keeps_bom_and_directive_first() {
        let before = "\u{feff}'use client';\nimport Chart from 'chart.js';\n";
        let out = transform(before, &chart());
        assert_eq!(
            out.after,
            "\u{feff}'use client';\nimport dynamic from 'next/dynamic';\nconst Chart = dynamic(() => import('chart.js'), { ssr: false })\n"
        );
    }

    #[test]
    fn test_transform_splits_code_sharing_the_import_line() {
        let before = "import Chart from 'chart.js'; export const C=()=> <div>{String(Chart)}</div>;";
        let out = transform(before, &chart());
        assert_eq!(
            out.after,
            "import dynamic from 'next/dynamic';\nconst Chart = dynamic(() => import('chart.js'), { ssr: false })\nexport const C=()=> <div>{String(Chart)}</div>;"
        );
    }

    #[test]
    fn test_transform_uses_renamed_helper() {
        let before = "import lazy from 'next/dynamic';\nimport Chart from 'chart.js';\n";
        let out = transform(before, &chart());
        assert_eq!(
            out.after,
            "import lazy from 'next/dynamic';\nconst Chart = lazy(() => import('chart.js'), { ssr: false })\n"
        );
    }
}
