use std::{
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::{boundary::Finding, dup_vendors::DupVendor};

/// Findings printed in full before the rest are summarized
const SHOWN_FINDINGS: usize = 8;

/// Express `rel` (relative to `root`) relative to the working directory, for clickable links.
fn relativize_to_cwd(root: &Path, rel: &str) -> String {
    let Ok(cwd) = env::current_dir() else {
        debug!("Failed to get current directory");
        return rel.to_string();
    };
    match relative_to(&root.join(rel), &cwd) {
        Some(p) => p.to_string_lossy().to_string(),
        None => {
            trace!("Could not relativize '{}', using original", rel);
            rel.to_string()
        }
    }
}

/// `target` relative to `base`, or `None` when they share no root.
fn relative_to(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    if target.first() != base.first() {
        return None;
    }
    let common = target.iter().zip(&base).take_while(|(t, b)| t == b).count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for c in &target[common..] {
        if let Component::Normal(p) = c {
            result.push(p);
        }
    }
    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

pub fn print_dup_vendors<W: Write>(writer: &mut W, dups: &[DupVendor]) -> io::Result<()> {
    if dups.is_empty() {
        writeln!(writer, "{} No duplicate heavy vendors across routes.", "✓".green().bold())?;
        return Ok(());
    }
    writeln!(writer, "{} Duplicate heavy vendors: {}", "⚠".yellow().bold(), dups.len())?;
    for d in dups {
        writeln!(
            writer,
            "  - {} on {} routes (~{:.1} KB): {}",
            d.lib.bold(),
            d.count,
            d.approx_kb,
            d.routes.join(", ").dimmed()
        )?;
    }
    Ok(())
}

/// Findings grouped under their file, in scan order.
pub fn print_findings_tree<W: Write>(writer: &mut W, findings: &[Finding], root: &Path) -> io::Result<()> {
    if findings.is_empty() {
        writeln!(writer, "{} No server-only-in-client issues.", "✓".green().bold())?;
        return Ok(());
    }
    writeln!(writer, "{} Server-only-in-client: {}\n", "✗".red().bold(), findings.len().to_string().red())?;

    let shown = &findings[..findings.len().min(SHOWN_FINDINGS)];
    let mut start = 0;
    while start < shown.len() {
        let file = &shown[start].file;
        let end = start + shown[start..].iter().take_while(|f| &f.file == file).count();
        writeln!(writer, "{}", relativize_to_cwd(root, file).blue())?;
        for (idx, f) in shown[start..end].iter().enumerate() {
            let prefix = if start + idx == end - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  {} {}", prefix.dimmed(), f.message, format!("[{}]", f.id).dimmed())?;
        }
        start = end;
    }
    if findings.len() > shown.len() {
        writeln!(writer, "  …and {} more", findings.len() - shown.len())?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{SERVER_ONLY_IN_CLIENT, Severity};

    fn finding(file: &str, module: &str) -> Finding {
        Finding {
            id: format!("F-SERVER-ONLY-{}", module),
            rule: SERVER_ONLY_IN_CLIENT,
            severity: Severity::Error,
            file: file.into(),
            message: format!("Client component imports server-only module \"{}\"", module),
            module: module.into(),
        }
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            relative_to(Path::new("/a/b/c.ts"), Path::new("/a/d")),
            Some(PathBuf::from("../b/c.ts"))
        );
        assert_eq!(relative_to(Path::new("/a"), Path::new("/a")), Some(PathBuf::from(".")));
    }

    #[test]
    fn test_findings_tree_groups_by_file() {
        colored::control::set_override(false);
        let findings = vec![finding("a.tsx", "fs"), finding("a.tsx", "os"), finding("b.tsx", "path")];
        let mut out = Vec::new();
        print_findings_tree(&mut out, &findings, Path::new("/nonexistent-root")).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Server-only-in-client: 3"));
        assert!(text.contains("├──  Client component imports server-only module \"fs\""));
        assert!(text.contains("└──  Client component imports server-only module \"os\""));
        assert!(text.contains("└──  Client component imports server-only module \"path\""));
    }

    #[test]
    fn test_empty_outputs() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_findings_tree(&mut out, &[], Path::new(".")).unwrap();
        print_dup_vendors(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No server-only-in-client issues."));
        assert!(text.contains("No duplicate heavy vendors across routes."));
    }
}
