use log::{debug, trace};
use nectar_core::read_source;
use serde::Serialize;
use similar::TextDiff;

use crate::{context::CodemodContext, rules, types::Suggestion};

/// Unified diff of one suggestion against current file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    pub file: String,
    pub diff: String,
}

/// `--- a/{file}` / `+++ b/{file}` diff with three lines of context, always newline terminated.
pub fn unified_diff(file: &str, before: &str, after: &str) -> String {
    let (old_name, new_name) = (format!("a/{}", file), format!("b/{}", file));
    let diff = TextDiff::from_lines(before, after);
    let mut patch = diff.unified_diff().context_radius(3).header(&old_name, &new_name).to_string();
    if !patch.ends_with('\n') {
        patch.push('\n');
    }
    patch
}

/// Diff every suggestion that would change its file. Nothing is written.
///
/// Unreadable files and no-op transforms produce no entry.
pub fn preview_diffs(ctx: &CodemodContext, suggestions: &[Suggestion]) -> Vec<FileDiff> {
    let mut out = Vec::new();
    for s in suggestions {
        let Some(before) = read_source(&ctx.root.join(&s.file)) else {
            continue;
        };
        let outcome = rules::transform(&before, &s.data);
        if !outcome.changed {
            trace!("{}: no diff ({})", s.file, outcome.reason.as_deref().unwrap_or("unchanged"));
            continue;
        }
        out.push(FileDiff { file: s.file.clone(), diff: unified_diff(&s.file, &before, &outcome.after) });
    }
    debug!("Previewed {} of {} suggestions", out.len(), suggestions.len());
    out
}

/// The diff artifact: one hunk set per changed file.
pub fn join_diffs(diffs: &[FileDiff]) -> String {
    diffs.iter().map(|d| d.diff.as_str()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DynamicImportData, SuggestionData};
    use nectar_core::NectarConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn chart(file: &str) -> Suggestion {
        Suggestion {
            file: file.into(),
            summary: String::new(),
            diff_preview: None,
            data: SuggestionData::DynamicHeavyDep(DynamicImportData {
                local_name: "Chart".into(),
                from: "chart.js".into(),
            }),
        }
    }

    #[test]
    fn test_unified_diff_header_and_newline() {
        let d = unified_diff("src/a.ts", "a\nb", "a\nc");
        assert!(d.starts_with("--- a/src/a.ts\n+++ b/src/a.ts\n@@"));
        assert!(d.contains("-b"));
        assert!(d.contains("+c"));
        assert!(d.ends_with('\n'));
    }

    #[test]
    fn test_preview_does_not_write() {
        let temp = TempDir::new().unwrap();
        let original = "import Chart from 'chart.js';\nexport default Chart;\n";
        create_test_file(temp.path(), "src/components/Chart.tsx", original);
        let ctx = CodemodContext::new(temp.path(), &NectarConfig::default());

        let diffs = preview_diffs(&ctx, &[chart("src/components/Chart.tsx"), chart("src/components/Missing.tsx")]);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].file, "src/components/Chart.tsx");
        assert!(diffs[0].diff.contains("--- a/src/components/Chart.tsx"));
        assert!(diffs[0].diff.contains("+import dynamic from 'next/dynamic';"));
        assert!(diffs[0].diff.contains("-import Chart from 'chart.js';"));

        let on_disk = fs::read_to_string(temp.path().join("src/components/Chart.tsx")).unwrap();
        assert_eq!(on_disk, original);
    }

    #[test]
    fn test_preview_skips_noop() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/components/Chart.tsx", "export const X = 1;\n");
        let ctx = CodemodContext::new(temp.path(), &NectarConfig::default());
        assert!(preview_diffs(&ctx, &[chart("src/components/Chart.tsx")]).is_empty());
    }
}
