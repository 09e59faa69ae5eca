use log::debug;
use nectar_core::BundleSnapshot;

use crate::{plan::PlanItem, types::Suggestion};

/// Sum of every asset whose path mentions `lib`, in KB rounded to one decimal.
///
/// Matching is by substring so hashed chunk names still count. A library
/// whose name is contained in another's is counted for both.
pub fn estimate_kb(snapshot: Option<&BundleSnapshot>, lib: &str) -> f64 {
    let Some(snap) = snapshot else {
        return 0.0;
    };
    let bytes: u64 = snap
        .asset_sizes
        .iter()
        .filter(|(asset, _)| asset.contains(lib))
        .map(|(_, bytes)| *bytes)
        .sum();
    round1(bytes as f64 / 1024.0)
}

/// Attach an estimate to every suggestion. Without a snapshot every estimate is 0.
pub fn estimate_impact(snapshot: Option<&BundleSnapshot>, suggestions: Vec<Suggestion>) -> Vec<PlanItem> {
    if snapshot.is_none() {
        debug!("No bundle snapshot; estimating 0 KB for {} suggestions", suggestions.len());
    }
    suggestions
        .into_iter()
        .map(|s| {
            let kb = estimate_kb(snapshot, s.target());
            PlanItem::new(s, kb)
        })
        .collect()
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
