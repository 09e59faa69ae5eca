//! Constants for file extensions and the on-disk layout of nectar artifacts.
//!
//! Scanning, backups and plan persistence all agree on these names, so they
//! live in one place.
//!
//! ## Supported Extensions
//!
//! - **TypeScript**: `.ts`, `.tsx`, `.mts` (ES module), `.cts` (CommonJS)
//! - **JavaScript**: `.js`, `.jsx`, `.mjs` (ES module), `.cjs` (CommonJS)

/// File extensions for JavaScript/TypeScript files that should be scanned
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

/// Directory names never descended into while scanning
pub const SKIP_DIRS: &[&str] = &["node_modules", ".git", ".nectar"];

/// Any entry whose name starts with this prefix is skipped (`.next`, `.next-dev`, ...)
pub const BUILD_OUTPUT_PREFIX: &str = ".next";

/// Project configuration file, relative to the project root
pub const CONFIG_FILE: &str = "nectar.config.json";

/// Artifact directory, relative to the project root
pub const NECTAR_DIR: &str = ".nectar";

/// Backup sets live under `{NECTAR_DIR}/{BACKUPS_DIR}/{timestamp}`
pub const BACKUPS_DIR: &str = "backups";

/// Default build manifest location, relative to the project root
pub const DEFAULT_MANIFEST: &str = ".next/build-manifest.json";

/// Build output directory that manifest asset paths are relative to
pub const BUILD_DIR: &str = ".next";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_ts_extensions_includes_all_variants() {
        for ext in ["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"] {
            assert!(JS_TS_EXTENSIONS.contains(&ext), "missing '{}'", ext);
        }
        assert_eq!(JS_TS_EXTENSIONS.len(), 8);
    }

    #[test]
    fn test_default_manifest_lives_in_build_dir() {
        assert!(DEFAULT_MANIFEST.starts_with(BUILD_DIR));
        assert!(BUILD_DIR.starts_with(BUILD_OUTPUT_PREFIX));
    }
}
