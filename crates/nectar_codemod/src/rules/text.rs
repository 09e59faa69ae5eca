//! Small lexical helpers shared by the rules.
//!
//! None of this is a JavaScript parser. The helpers only know what an
//! identifier looks like and where a line ends.

use regex::Regex;
use std::sync::OnceLock;

static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// `^[A-Za-z_$][\w$]*$`
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// The line terminator a file already uses.
pub(crate) fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Byte offset just past a leading `'use client'`-style directive.
///
/// A BOM, blank lines and comments may precede the directive. Without a
/// directive this is the offset just past the BOM, if any.
pub(crate) fn directive_end(text: &str) -> usize {
    let re = DIRECTIVE_RE.get_or_init(|| {
        Regex::new(
            r#"\A\x{FEFF}?(?:\s|//[^\n]*|/\*(?s:.*?)\*/)*['"]use [\w ]+['"][ \t]*;?[ \t]*(?:\r?\n|\z)"#,
        )
        .expect("directive regex is valid")
    });
    match re.find(text) {
        Some(m) => m.end(),
        None if text.starts_with('\u{feff}') => '\u{feff}'.len_utf8(),
        None => 0,
    }
}

/// True when the char before `pos` cannot continue an identifier or member chain.
fn standalone_at(text: &str, pos: usize) -> bool {
    match text[..pos].chars().next_back() {
        None => true,
        Some(c) => !is_ident_char(c) && c != '.',
    }
}

/// Distinct members accessed as `ns.member`, in order of first use.
pub(crate) fn qualified_members(text: &str, ns: &str) -> Vec<String> {
    let needle = format!("{}.", ns);
    let mut members: Vec<String> = Vec::new();
    for (pos, _) in text.match_indices(&needle) {
        if !standalone_at(text, pos) {
            continue;
        }
        let rest = &text[pos + needle.len()..];
        if !rest.starts_with(is_ident_start) {
            continue;
        }
        let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        let member = &rest[..len];
        if !members.iter().any(|m| m == member) {
            members.push(member.to_string());
        }
    }
    members
}

/// Replace every standalone `ns.member` with `member`.
pub(crate) fn replace_qualified(text: &str, ns: &str, member: &str) -> String {
    let needle = format!("{}.{}", ns, member);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (pos, _) in text.match_indices(&needle) {
        let end = pos + needle.len();
        let ends_cleanly = !text[end..].starts_with(is_ident_char);
        if !standalone_at(text, pos) || !ends_cleanly {
            continue;
        }
        out.push_str(&text[last..pos]);
        out.push_str(member);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}
