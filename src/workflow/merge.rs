//! Merge engine: fold a partial update into the stored version.

use crate::models::{State, Version, VersionLinks};

fn fallback_str(update: &str, current: &str) -> String {
    let value = if update.is_empty() { current } else { update };
    value.to_string()
}

fn fallback_list<T: Clone>(update: &Option<Vec<T>>, current: &Option<Vec<T>>) -> Option<Vec<T>> {
    match update {
        Some(items) if !items.is_empty() => Some(items.clone()),
        _ => current.clone(),
    }
}

fn append<T: Clone>(current: &Option<Vec<T>>, update: &Option<Vec<T>>) -> Option<Vec<T>> {
    match (current, update) {
        (None, None) => None,
        _ => {
            let mut merged = current.clone().unwrap_or_default();
            merged.extend(update.iter().flatten().cloned());
            Some(merged)
        }
    }
}

/// Produce the candidate document for `update` applied to `current`.
///
/// - identity (`id`, dataset, edition, version number) and the dataset type
///   always come from `current`
/// - empty scalars and lists in `update` keep the stored value
/// - alerts and latest changes are appended to the stored ones
/// - downloads merge per format
/// - links are the stored links; only `spatial` may be set by the update
/// - a published candidate never carries a collection ID
pub fn combine(current: &Version, update: &Version) -> Version {
    let mut candidate = Version {
        id: current.id.clone(),
        dataset_id: current.dataset_id.clone(),
        edition: current.edition.clone(),
        version: current.version,
        dataset_type: current.dataset_type.clone(),
        state: update.state.or(current.state),
        collection_id: fallback_str(&update.collection_id, &current.collection_id),
        release_date: fallback_str(&update.release_date, &current.release_date),
        temporal: fallback_list(&update.temporal, &current.temporal),
        alerts: append(&current.alerts, &update.alerts),
        latest_changes: append(&current.latest_changes, &update.latest_changes),
        usage_notes: fallback_list(&update.usage_notes, &current.usage_notes),
        downloads: None,
        links: current.links.clone(),
        last_updated: current.last_updated,
        e_tag: current.e_tag.clone(),
    };

    candidate.downloads = match &update.downloads {
        None => current.downloads.clone(),
        Some(downloads) => {
            let mut merged = downloads.clone();
            if let Some(stored) = &current.downloads {
                merged.fill_missing_from(stored);
            }
            Some(merged)
        }
    };

    if let Some(spatial) = update.links.as_ref().and_then(|links| links.spatial.as_ref()) {
        candidate
            .links
            .get_or_insert_with(VersionLinks::default)
            .spatial = Some(spatial.clone());
    }

    if candidate.state == Some(State::Published) {
        candidate.collection_id.clear();
    }

    candidate
}
