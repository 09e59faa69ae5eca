use nectar_core::{BACKUPS_DIR, NECTAR_DIR, NectarConfig};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Everything one codemod invocation needs to know about the project.
///
/// Created once per invocation and passed explicitly to discovery, preview and
/// apply; nothing in this crate reads the working directory on its own.
#[derive(Debug, Clone)]
pub struct CodemodContext {
    pub root: PathBuf,
    pub backups_root: PathBuf,
    pub heavy_deps: HashSet<String>,
    pub dynamic_allowlist: Vec<String>,
    pub star_import_enabled: bool,
    pub dynamic_enabled: bool,
}

impl CodemodContext {
    pub fn new(root: impl AsRef<Path>, cfg: &NectarConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            backups_root: root.join(NECTAR_DIR).join(BACKUPS_DIR),
            root,
            heavy_deps: cfg.heavy_deps.iter().cloned().collect(),
            dynamic_allowlist: cfg.dynamic_allowlist.clone(),
            star_import_enabled: cfg.rules.star_import_enabled(),
            dynamic_enabled: cfg.rules.dynamic_enabled(),
        }
    }

    pub fn with_backups_root(mut self, backups_root: impl Into<PathBuf>) -> Self {
        self.backups_root = backups_root.into();
        self
    }

    pub fn is_heavy(&self, lib: &str) -> bool {
        self.heavy_deps.contains(lib)
    }
}
