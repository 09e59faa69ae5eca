//! Markdown and JSON renderings of a plan. Pure; the caller does the I/O.

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::{impact::round1, plan::PlanItem};

pub const COMMENT_MARKER: &str = "<!-- NECTAR_PR_COMMENT -->";
const SUMMARY_ROWS: usize = 50;
const REPORT_CLIP: usize = 6000;
const DIFF_CLIP: usize = 60000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RuleTotal {
    pub count: usize,
    pub kb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub count: usize,
    #[serde(rename = "totalKB")]
    pub total_kb: f64,
    pub by_rule: BTreeMap<String, RuleTotal>,
}

pub fn totals(items: &[PlanItem]) -> Totals {
    let mut t = Totals { count: items.len(), ..Default::default() };
    for item in items {
        t.total_kb += item.estimated_kb;
        let rule = t.by_rule.entry(item.suggestion.kind().to_string()).or_default();
        rule.count += 1;
        rule.kb += item.estimated_kb;
    }
    t.total_kb = round1(t.total_kb);
    for rule in t.by_rule.values_mut() {
        rule.kb = round1(rule.kb);
    }
    t
}

pub fn summary_markdown(items: &[PlanItem]) -> String {
    let header = "## Suggestions Summary\n\n";
    if items.is_empty() {
        return format!("{}_No suggestions._\n", header);
    }
    let mut lines = vec![
        header.to_string(),
        "| ID | Rule | Target | File | Est. KB |".to_string(),
        "|---:|:-----|:-------|:-----|-------:|".to_string(),
    ];
    for item in items.iter().take(SUMMARY_ROWS) {
        let s = &item.suggestion;
        lines.push(format!(
            "|`{}`|{}|{}|{}|{:.1}|",
            item.id,
            s.kind(),
            s.target(),
            s.file,
            item.estimated_kb
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// A pull request comment: summary, quick commands, then optional report and diff excerpts.
pub fn comment_markdown(items: &[PlanItem], report: Option<&str>, diff: Option<&str>) -> String {
    let mut out = format!(
        "{}\n# 🌺 nectar suggestions\n\nUse `--only <id,id>` or `--except <id,id>` to refine next runs.\n\n",
        COMMENT_MARKER
    );
    out.push_str(&summary_markdown(items));

    if !items.is_empty() {
        out.push_str("\n### Quick commands\n\n```bash\n");
        out.push_str("nectar codemod --limit 3 --apply --no-typecheck\n");
        out.push_str("nectar codemod --only <id> --apply --no-typecheck\n");
        out.push_str("```\n");
    }
    if let Some(report) = report.filter(|r| !r.is_empty()) {
        out.push_str(&format!(
            "\n## Report (excerpt)\n\n<details><summary>Open</summary>\n\n```md\n{}\n```\n\n</details>\n",
            clip(report, REPORT_CLIP)
        ));
    }
    if let Some(diff) = diff.filter(|d| !d.is_empty()) {
        out.push_str(&format!(
            "\n## Proposed Diff (dry-run)\n\n<details><summary>Open unified diff</summary>\n\n```diff\n{}\n```\n\n</details>\n",
            clip(diff, DIFF_CLIP)
        ));
    }
    out
}

pub fn plan_json(items: &[PlanItem]) -> Value {
    json!({ "items": items, "totals": totals(items) })
}

/// Keep the first `max` characters, noting the original length when cut.
pub fn clip(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max).collect();
    format!("{}\n... (truncated, total {} chars)", head, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DynamicImportData, StarImportData, Suggestion, SuggestionData};

    fn items() -> Vec<PlanItem> {
        vec![
            PlanItem::new(
                Suggestion {
                    file: "src/components/Chart.tsx".into(),
                    summary: String::new(),
                    diff_preview: None,
                    data: SuggestionData::DynamicHeavyDep(DynamicImportData {
                        local_name: "Chart".into(),
                        from: "chart.js".into(),
                    }),
                },
                120.0,
            ),
            PlanItem::new(
                Suggestion {
                    file: "src/pages/Date.tsx".into(),
                    summary: String::new(),
                    diff_preview: None,
                    data: SuggestionData::StarImport(StarImportData {
                        ns: "d".into(),
                        lib: "date-fns".into(),
                        used_members: vec!["format".into()],
                    }),
                },
                40.04,
            ),
        ]
    }

    #[test]
    fn test_totals_by_rule() {
        let t = totals(&items());
        assert_eq!(t.count, 2);
        assert_eq!(t.total_kb, 160.0);
        assert_eq!(t.by_rule["DYNAMIC_HEAVY_DEP"], RuleTotal { count: 1, kb: 120.0 });
        assert_eq!(t.by_rule["STAR_IMPORT_SLIMMING"].count, 1);
    }

    #[test]
    fn test_summary_table() {
        let all = items();
        let md = summary_markdown(&all);
        assert!(md.starts_with("## Suggestions Summary\n\n"));
        assert!(md.contains("| ID | Rule | Target | File | Est. KB |"));
        assert!(md.contains(&format!("|`{}`|DYNAMIC_HEAVY_DEP|chart.js|src/components/Chart.tsx|120.0|", all[0].id)));
        assert!(md.contains("|STAR_IMPORT_SLIMMING|date-fns|src/pages/Date.tsx|40.0|"));
        assert_eq!(summary_markdown(&[]), "## Suggestions Summary\n\n_No suggestions._\n");
    }

    #[test]
    fn test_comment_sections() {
        let md = comment_markdown(&items(), Some("report body"), None);
        assert!(md.starts_with(COMMENT_MARKER));
        assert!(md.contains("# 🌺 nectar suggestions"));
        assert!(md.contains("### Quick commands"));
        assert!(md.contains("## Report (excerpt)"));
        assert!(!md.contains("Proposed Diff"));

        let empty = comment_markdown(&[], None, None);
        assert!(empty.contains("_No suggestions._"));
        assert!(!empty.contains("Quick commands"));
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("abc", 5), "abc");
        assert_eq!(clip("abcdef", 3), "abc\n... (truncated, total 6 chars)");
    }

    #[test]
    fn test_plan_json_has_items_and_totals() {
        let v = plan_json(&items());
        assert_eq!(v["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["totals"]["count"], 2);
        assert_eq!(v["totals"]["byRule"]["DYNAMIC_HEAVY_DEP"]["count"], 1);
    }
}
