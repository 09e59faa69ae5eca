use log::debug;
use nectar_core::BundleSnapshot;
use serde::Serialize;

/// A heavy library shipped in the initial JS of several routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DupVendor {
    pub lib: String,
    pub count: usize,
    pub routes: Vec<String>,
    #[serde(rename = "approxKB")]
    pub approx_kb: f64,
}

/// Heavy libraries whose name appears in assets of two or more routes, largest first.
///
/// Each matching asset contributes an equal share of its route's initial JS.
pub fn detect_duplicate_vendors(snap: &BundleSnapshot, heavy_deps: &[String]) -> Vec<DupVendor> {
    // (lib, routes, kb) in order of first sighting
    let mut seen: Vec<(&str, Vec<&str>, f64)> = Vec::new();

    for route in &snap.routes {
        let share = route.initial_js_kb / route.assets.len().max(1) as f64;
        for asset in &route.assets {
            for lib in heavy_deps.iter().filter(|lib| asset.contains(lib.as_str())) {
                let idx = match seen.iter().position(|(l, _, _)| *l == lib.as_str()) {
                    Some(i) => i,
                    None => {
                        seen.push((lib.as_str(), Vec::new(), 0.0));
                        seen.len() - 1
                    }
                };
                let entry = &mut seen[idx];
                if !entry.1.contains(&route.path.as_str()) {
                    entry.1.push(route.path.as_str());
                }
                entry.2 += share;
            }
        }
    }

    let mut out: Vec<DupVendor> = seen
        .into_iter()
        .filter(|(_, routes, _)| routes.len() >= 2)
        .map(|(lib, routes, kb)| DupVendor {
            lib: lib.to_string(),
            count: routes.len(),
            routes: routes.into_iter().map(String::from).collect(),
            approx_kb: (kb * 10.0).round() / 10.0,
        })
        .collect();
    out.sort_by(|a, b| b.approx_kb.total_cmp(&a.approx_kb));
    debug!("Found {} duplicate heavy vendors", out.len());
    out
}
