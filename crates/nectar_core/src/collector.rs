use ignore::WalkBuilder;
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{BUILD_OUTPUT_PREFIX, JS_TS_EXTENSIONS, SKIP_DIRS};

/// A candidate source file read fully into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Project-relative path with `/` separators
    pub rel: String,
    pub text: String,
}

/// Walk `root` and return every candidate JS/TS source file, sorted by path.
///
/// Entries that cannot be read while walking are skipped.
pub fn collect_sources(root: &Path) -> Vec<PathBuf> {
    debug!("Walking directory tree from root: {}", root.display());
    // ignore files do not apply: gitignored sources still ship
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|dent| {
            let name = dent.file_name().to_string_lossy();
            !(name.starts_with(BUILD_OUTPUT_PREFIX) || SKIP_DIRS.contains(&name.as_ref()))
        })
        .build();

    let mut files: Vec<PathBuf> = Vec::new();
    for res in walker {
        let dent = match res {
            Ok(d) => d,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        // Skip test files (*.test.*, *.spec.*)
        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        if let Some(ext) = p.extension().and_then(|e| e.to_str())
            && JS_TS_EXTENSIONS.contains(&ext)
        {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    debug!("Collected {} source files", files.len());
    files
}

/// Read a file as UTF-8, returning `None` when it cannot be read.
pub fn read_source(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

/// Collect and read every candidate file under `root`. Unreadable files are dropped.
pub fn load_sources(root: &Path) -> Vec<SourceFile> {
    collect_sources(root)
        .into_iter()
        .filter_map(|path| {
            let text = read_source(&path)?;
            let rel = relative_path(root, &path);
            Some(SourceFile { path, rel, text })
        })
        .collect()
}

/// Project-relative form of `path` using `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_collects_js_ts_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/b.tsx", "");
        create_test_file(root, "src/a.ts", "");
        create_test_file(root, "src/styles.css", "");
        create_test_file(root, "README.md", "");

        let rels: Vec<String> =
            collect_sources(root).iter().map(|p| relative_path(root, p)).collect();
        assert_eq!(rels, vec!["src/a.ts".to_string(), "src/b.tsx".to_string()]);
    }

    #[test]
    fn test_skips_build_output_and_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, ".next/static/chunks/main.js", "");
        create_test_file(root, ".next-dev/x.js", "");
        create_test_file(root, "node_modules/chart.js/index.js", "");
        create_test_file(root, ".nectar/backups/1/src__a.ts", "");
        create_test_file(root, "src/keep.js", "");

        let rels: Vec<String> =
            collect_sources(root).iter().map(|p| relative_path(root, p)).collect();
        assert_eq!(rels, vec!["src/keep.js".to_string()]);
    }

    #[test]
    fn test_scans_ignored_and_hidden_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        create_test_file(root, ".gitignore", "src/generated/\n");
        create_test_file(root, ".ignore", "src/vendor.ts\n");
        create_test_file(root, "src/generated/api.ts", "");
        create_test_file(root, "src/vendor.ts", "");
        create_test_file(root, ".storybook/preview.tsx", "");

        let rels: Vec<String> =
            collect_sources(root).iter().map(|p| relative_path(root, p)).collect();
        assert_eq!(
            rels,
            vec![
                ".storybook/preview.tsx".to_string(),
                "src/generated/api.ts".to_string(),
                "src/vendor.ts".to_string(),
            ]
        );
    }

    #[test]
    fn test_skips_test_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/a.test.ts", "");
        create_test_file(root, "src/a.spec.tsx", "");
        create_test_file(root, "src/a.ts", "");

        assert_eq!(collect_sources(root).len(), 1);
    }

    #[test]
    fn test_load_sources_reads_content() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/components/Chart.tsx", "import Chart from 'chart.js';");

        let sources = load_sources(root);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].rel, "src/components/Chart.tsx");
        assert_eq!(sources[0].text, "import Chart from 'chart.js';");
    }

    #[test]
    fn test_read_source_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_source(&temp_dir.path().join("nope.ts")).is_none());
    }
}
