//! STAR_IMPORT_SLIMMING: `import * as ns from 'lib'` becomes one subpath
//! import per member actually used, and `ns.member` becomes `member`.

use log::{debug, trace, warn};
use nectar_core::SourceFile;
use regex::Regex;
use std::{collections::HashSet, sync::OnceLock};

use super::{
    Detector,
    text::{directive_end, is_identifier, line_ending, qualified_members, replace_qualified},
};
use crate::types::{
    RuleKind, StarImportData, Suggestion, SuggestionData, TransformOutcome,
};

static STAR_IMPORT_RE: OnceLock<Regex> = OnceLock::new();
static IMPORT_STATEMENT_RE: OnceLock<Regex> = OnceLock::new();

/// How many members are spelled out in summaries and previews
const PREVIEW_MEMBERS: usize = 6;

pub struct StarImportDetector<'a> {
    heavy_deps: &'a HashSet<String>,
}

impl<'a> StarImportDetector<'a> {
    pub fn new(heavy_deps: &'a HashSet<String>) -> Self {
        Self { heavy_deps }
    }
}

impl Detector for StarImportDetector<'_> {
    fn rule(&self) -> RuleKind {
        RuleKind::StarImportSlimming
    }

    fn detect(&self, file: &SourceFile) -> Vec<Suggestion> {
        let re = STAR_IMPORT_RE.get_or_init(|| {
            Regex::new(r#"import\s*\*\s*as\s+([A-Za-z_$][\w$]*)\s+from\s*["']([^"']+)["']"#)
                .expect("star import regex is valid")
        });

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut out = Vec::new();
        for caps in re.captures_iter(&file.text) {
            let (Some(ns), Some(lib)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let (ns, lib) = (ns.as_str(), lib.as_str());
            if !self.heavy_deps.contains(lib) || !seen.insert((ns, lib)) {
                continue;
            }

            let members = qualified_members(&file.text, ns);
            if members.is_empty() {
                trace!("{}: star import of {} has no member usages", file.rel, lib);
                continue;
            }
            debug!("{}: star import of {} uses {} members", file.rel, lib, members.len());

            out.push(Suggestion {
                file: file.rel.clone(),
                summary: summary(lib, &members),
                diff_preview: Some(preview(ns, lib, &members)),
                data: SuggestionData::StarImport(StarImportData {
                    ns: ns.to_string(),
                    lib: lib.to_string(),
                    used_members: members,
                }),
            });
        }
        out
    }
}

fn summary(lib: &str, members: &[String]) -> String {
    let shown: Vec<&str> = members.iter().take(PREVIEW_MEMBERS).map(String::as_str).collect();
    let more = if members.len() > PREVIEW_MEMBERS { "…" } else { "" };
    format!("Replace star import of {} with subpaths: {}{}", lib, shown.join(", "), more)
}

fn preview(ns: &str, lib: &str, members: &[String]) -> String {
    let mut lines = vec![format!("- import * as {} from '{}'", ns, lib)];
    lines.extend(
        members.iter().take(PREVIEW_MEMBERS).map(|m| format!("+ import {} from '{}/{}'", m, lib, m)),
    );
    if members.len() > PREVIEW_MEMBERS {
        lines.push(format!("+ // …and {} more", members.len() - PREVIEW_MEMBERS));
    }
    lines.join("\n")
}

/// Rewrite `content` so that `data.ns` no longer binds the whole of `data.lib`.
pub fn transform(content: &str, data: &StarImportData) -> TransformOutcome {
    let pattern = format!(
        r#"import\s*\*\s*as\s+{}\s+from\s*['"]{}['"][ \t]*;?"#,
        regex::escape(&data.ns),
        regex::escape(&data.lib)
    );
    let star_re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Cannot build star import pattern for {}: {}", data.lib, e);
            return TransformOutcome::unchanged(content, "Star import pattern invalid");
        }
    };

    let removed = remove_star_imports(content, &star_re);
    if removed == content {
        return TransformOutcome::unchanged(content, "Star import not found");
    }

    let mut members: Vec<&str> = Vec::new();
    for m in data.used_members.iter().map(String::as_str).filter(|m| is_identifier(m)) {
        if !members.contains(&m) {
            members.push(m);
        }
    }
    if members.is_empty() {
        // dropping the import would leave every `ns.x` dangling
        return TransformOutcome::unchanged(content, "No identifier-shaped members to import");
    }

    let eol = line_ending(content);
    let block: String = members
        .iter()
        .map(|m| format!("import {} from '{}/{}';{}", m, data.lib, m, eol))
        .collect();
    let mut after = insert_after_imports(&removed, &block, eol);

    for m in &members {
        after = replace_qualified(&after, &data.ns, m);
    }

    TransformOutcome::from_rewrite(content, after)
}

/// Remove every matching statement, one at a time, so that statements sharing
/// a line are each handled against the already-shortened text.
fn remove_star_imports(content: &str, re: &Regex) -> String {
    let mut text = content.to_string();
    loop {
        let next = re
            .find_iter(&text)
            .map(|m| (m.start(), m.end()))
            .find(|(start, _)| starts_statement(&text, *start));
        let Some((start, end)) = next else {
            break;
        };
        let (from, to) = removal_span(&text, start, end);
        trace!("Removing star import at {}..{}", from, to);
        text.replace_range(from..to, "");
    }
    text
}

fn starts_statement(text: &str, pos: usize) -> bool {
    match text[..pos].chars().next_back() {
        None => true,
        Some(c) => c.is_whitespace() || c == ';',
    }
}

/// The byte range to delete for the statement at `start..end`.
///
/// A statement alone on its line takes the whole line with it; otherwise only
/// the statement and the horizontal whitespace that separated it goes.
fn removal_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let rest = &text[end..];
    let after_ws = end + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
    let tail = &text[after_ws..];
    let eol_len = if tail.starts_with("\r\n") {
        2
    } else if tail.starts_with('\n') {
        1
    } else {
        0
    };
    let at_eol = eol_len > 0 || tail.is_empty();
    let prefix = &text[line_start..start];

    if !at_eol {
        (start, after_ws)
    } else if prefix.trim().is_empty() {
        (line_start, after_ws + eol_len)
    } else {
        let kept = prefix.trim_end_matches([' ', '\t']).len();
        (line_start + kept, after_ws)
    }
}

/// Insert `block` right after the last import statement that ends its line, or
/// at the top of the file (after any leading directive) when there is none.
pub(crate) fn insert_after_imports(src: &str, block: &str, eol: &str) -> String {
    let re = IMPORT_STATEMENT_RE.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*import[\s{*][^;'"]*?['"][^'"\r\n]*['"][ \t]*;?[ \t]*(?:\r?\n|\z)"#)
            .expect("import statement regex is valid")
    });

    let at = match re.find_iter(src).last() {
        Some(m) => m.end(),
        None => directive_end(src),
    };

    let mut out = String::with_capacity(src.len() + block.len() + eol.len());
    out.push_str(&src[..at]);
    if at > 0 && at == src.len() && !src.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(block);
    out.push_str(&src[at..]);
    out
}
