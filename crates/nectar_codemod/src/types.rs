use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// The codemod rules. Each rule owns one [`SuggestionData`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
pub enum RuleKind {
    #[serde(rename = "STAR_IMPORT_SLIMMING")]
    #[value(name = "STAR_IMPORT_SLIMMING")]
    StarImportSlimming,
    #[serde(rename = "DYNAMIC_HEAVY_DEP")]
    #[value(name = "DYNAMIC_HEAVY_DEP")]
    DynamicHeavyDep,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::StarImportSlimming => "STAR_IMPORT_SLIMMING",
            RuleKind::DynamicHeavyDep => "DYNAMIC_HEAVY_DEP",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `import * as ns from 'lib'` together with the members read through `ns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarImportData {
    pub ns: String,
    pub lib: String,
    pub used_members: Vec<String>,
}

/// `import localName from 'from'` to be loaded lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicImportData {
    pub local_name: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum SuggestionData {
    #[serde(rename = "STAR_IMPORT_SLIMMING")]
    StarImport(StarImportData),
    #[serde(rename = "DYNAMIC_HEAVY_DEP")]
    DynamicHeavyDep(DynamicImportData),
}

/// A proposed, not yet applied, source rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Project-relative path with `/` separators
    pub file: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_preview: Option<String>,
    #[serde(flatten)]
    pub data: SuggestionData,
}

impl Suggestion {
    pub fn kind(&self) -> RuleKind {
        match &self.data {
            SuggestionData::StarImport(_) => RuleKind::StarImportSlimming,
            SuggestionData::DynamicHeavyDep(_) => RuleKind::DynamicHeavyDep,
        }
    }

    /// The library this suggestion slims or defers.
    pub fn target(&self) -> &str {
        match &self.data {
            SuggestionData::StarImport(d) => &d.lib,
            SuggestionData::DynamicHeavyDep(d) => &d.from,
        }
    }

    /// Whether the payload carries enough data to be applied.
    pub fn is_applicable(&self) -> bool {
        match &self.data {
            SuggestionData::StarImport(d) => {
                !d.ns.is_empty() && !d.lib.is_empty() && !d.used_members.is_empty()
            }
            SuggestionData::DynamicHeavyDep(d) => !d.local_name.is_empty() && !d.from.is_empty(),
        }
    }
}

/// Result of a pure transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub after: String,
    pub changed: bool,
    /// Why nothing changed, when `changed` is false
    pub reason: Option<String>,
}

impl TransformOutcome {
    pub(crate) fn unchanged(content: &str, reason: &str) -> Self {
        Self { after: content.to_string(), changed: false, reason: Some(reason.to_string()) }
    }

    pub(crate) fn from_rewrite(before: &str, after: String) -> Self {
        let changed = after != before;
        let reason = (!changed).then(|| "No textual change produced".to_string());
        Self { after, changed, reason }
    }
}

/// Audit record of one attempted suggestion. Consumed by rollback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub file: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_delta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backups_path: Option<PathBuf>,
}

impl ApplyResult {
    pub(crate) fn skipped(file: &str, reason: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            applied: false,
            reason: Some(reason.into()),
            bytes_delta: None,
            backups_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suggestion_json_shape() {
        let s = Suggestion {
            file: "src/pages/date.tsx".into(),
            summary: "s".into(),
            diff_preview: None,
            data: SuggestionData::StarImport(StarImportData {
                ns: "dateFns".into(),
                lib: "date-fns".into(),
                used_members: vec!["format".into()],
            }),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(
            v,
            json!({
                "file": "src/pages/date.tsx",
                "summary": "s",
                "kind": "STAR_IMPORT_SLIMMING",
                "data": { "ns": "dateFns", "lib": "date-fns", "usedMembers": ["format"] }
            })
        );
        let back: Suggestion = serde_json::from_value(v).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_dynamic_suggestion_from_json() {
        let s: Suggestion = serde_json::from_value(json!({
            "kind": "DYNAMIC_HEAVY_DEP",
            "file": "src/components/Chart.tsx",
            "data": { "localName": "Chart", "from": "chart.js" }
        }))
        .unwrap();
        assert_eq!(s.kind(), RuleKind::DynamicHeavyDep);
        assert_eq!(s.target(), "chart.js");
        assert!(s.summary.is_empty());
        assert!(s.is_applicable());
    }

    #[test]
    fn test_star_import_without_members_is_not_applicable() {
        let s = Suggestion {
            file: "a.ts".into(),
            summary: String::new(),
            diff_preview: None,
            data: SuggestionData::StarImport(StarImportData {
                ns: "d".into(),
                lib: "date-fns".into(),
                used_members: vec![],
            }),
        };
        assert!(!s.is_applicable());
    }
}
