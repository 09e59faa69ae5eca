use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::types::{Suggestion, SuggestionData};

/// Length of the hex prefix used as a suggestion id
pub const ID_LEN: usize = 12;

/// Stable short id of a suggestion, derived from `{kind, file, data}` only.
///
/// Member lists are deduplicated and sorted, and `serde_json` objects keep
/// their keys sorted, so neither key order nor member order affects the id.
pub fn suggestion_id(s: &Suggestion) -> String {
    let digest = Sha256::digest(canonical(s).to_string().as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(ID_LEN);
    id
}

fn canonical(s: &Suggestion) -> Value {
    let data = match &s.data {
        SuggestionData::StarImport(d) => {
            let mut used: Vec<&str> = d.used_members.iter().map(String::as_str).collect();
            used.sort_unstable();
            used.dedup();
            json!({ "lib": d.lib, "ns": d.ns, "used": used })
        }
        SuggestionData::DynamicHeavyDep(d) => json!({ "from": d.from, "local": d.local_name }),
    };
    json!({ "kind": s.kind().as_str(), "file": s.file, "data": data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DynamicImportData, StarImportData};

    fn star(used: &[&str]) -> Suggestion {
        Suggestion {
            file: "src/pages/Date.tsx".into(),
            summary: String::new(),
            diff_preview: None,
            data: SuggestionData::StarImport(StarImportData {
                ns: "d".into(),
                lib: "date-fns".into(),
                used_members: used.iter().map(|s| s.to_string()).collect(),
            }),
        }
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
    fn test_id_stable_across_member_and_key_order() {
        let a = star(&["format", "parseISO"]);
        let b: Suggestion = serde_json::from_value(json!({
            "data": { "usedMembers": ["parseISO", "format", "format"], "lib": "date-fns", "ns": "d" },
            "file": "src/pages/Date.tsx",
            "kind": "STAR_IMPORT_SLIMMING"
        }))
        .unwrap();
        assert_eq!(suggestion_id(&a), suggestion_id(&b));
    }

    #[test]
    fn test_id_ignores_presentation_fields() {
        let mut a = chart("src/components/Chart.tsx");
        let b = a.clone();
        a.summary = "wrap chart.js".into();
        a.diff_preview = Some("+ x".into());
        assert_eq!(suggestion_id(&a), suggestion_id(&b));
    }

    #[test]
    fn test_id_differs_per_file() {
        let x = suggestion_id(&chart("src/components/Chart.tsx"));
        let y = suggestion_id(&chart("src/components/Graph.tsx"));
        assert_ne!(x, y);
        assert_eq!(x.len(), ID_LEN);
        assert!(x.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
