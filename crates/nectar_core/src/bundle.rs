use anyhow::{Context, Result};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use crate::constants::{BUILD_DIR, DEFAULT_MANIFEST};

#[derive(Debug, Deserialize)]
struct BuildManifest {
    pages: BTreeMap<String, Vec<String>>,
}

/// Initial JavaScript shipped for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteJs {
    pub path: String,
    #[serde(rename = "initialJsKB")]
    pub initial_js_kb: f64,
    pub assets: Vec<String>,
}

/// Normalized per-route asset model of one build. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSnapshot {
    pub routes: Vec<RouteJs>,
    /// Bytes per asset path, `0` when the size is unknown
    pub asset_sizes: BTreeMap<String, u64>,
    pub created_at: String,
}

/// Read the build manifest (default `.next/build-manifest.json`) and an optional
/// `{assetPath: bytes}` size map into a [`BundleSnapshot`].
///
/// Returns `None` when the manifest or the size map is missing or malformed.
pub fn read_bundle_snapshot(
    root: &Path,
    manifest_path: Option<&Path>,
    sizes_path: Option<&Path>,
) -> Option<BundleSnapshot> {
    match try_read_bundle_snapshot(root, manifest_path, sizes_path) {
        Ok(snap) => Some(snap),
        Err(e) => {
            warn!("No bundle snapshot: {:#}", e);
            None
        }
    }
}

fn try_read_bundle_snapshot(
    root: &Path,
    manifest_path: Option<&Path>,
    sizes_path: Option<&Path>,
) -> Result<BundleSnapshot> {
    let default_manifest = root.join(DEFAULT_MANIFEST);
    let manifest_path = manifest_path.unwrap_or(&default_manifest);
    debug!("Reading build manifest from {}", manifest_path.display());

    let raw = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest: BuildManifest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

    let sizes_lookup: HashMap<String, u64> = match sizes_path {
        Some(p) => {
            let raw =
                fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", p.display()))?
        }
        None => HashMap::new(),
    };
    debug!("Loaded {} entries from size map", sizes_lookup.len());

    let build_dir = root.join(BUILD_DIR);
    let mut asset_sizes: BTreeMap<String, u64> = BTreeMap::new();
    let mut routes = Vec::with_capacity(manifest.pages.len());

    for (route, assets) in manifest.pages {
        let js_assets: Vec<String> = assets.into_iter().filter(|a| a.ends_with(".js")).collect();

        for rel in &js_assets {
            if asset_sizes.contains_key(rel) {
                continue;
            }
            let size = match sizes_lookup.get(rel) {
                Some(bytes) => *bytes,
                None => fs::metadata(build_dir.join(rel)).map(|m| m.len()).unwrap_or(0),
            };
            trace!("Asset {} = {} bytes", rel, size);
            asset_sizes.insert(rel.clone(), size);
        }

        let total_bytes: u64 = js_assets.iter().filter_map(|a| asset_sizes.get(a)).sum();
        routes.push(RouteJs {
            path: route,
            initial_js_kb: total_bytes as f64 / 1024.0,
            assets: js_assets,
        });
    }

    debug!("Snapshot has {} routes and {} assets", routes.len(), asset_sizes.len());
    Ok(BundleSnapshot { routes, asset_sizes, created_at: chrono::Utc::now().to_rfc3339() })
}
