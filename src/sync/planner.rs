//! Change detection by last-modified marker

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::payload::SyncItems;
use crate::error::Result;
use crate::storage::{Entity, KmlDataSource, MapDataSource, Storage};
use crate::types::{Kml, Map};

/// An entity whose staleness is decided by its last-modified marker
pub trait Synced: Entity {
    fn last_modified(&self) -> &str;
}

impl Synced for Map {
    fn last_modified(&self) -> &str {
        &self.last_modified
    }
}

impl Synced for Kml {
    fn last_modified(&self) -> &str {
        &self.last_modified
    }
}

fn parse_marker(marker: &str) -> Option<DateTime<Utc>> {
    let marker = marker.trim();
    DateTime::parse_from_rfc3339(marker)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // SQLite CURRENT_TIMESTAMP format
            NaiveDateTime::parse_from_str(marker, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

/// Order two last-modified markers.
///
/// Markers that both parse as timestamps compare as instants, so differing
/// UTC offsets are handled. A marker that does not parse (empty, or a
/// placeholder like "default last modified") is older than any timestamp.
/// Two unparseable markers fall back to string order.
pub fn compare_markers(a: &str, b: &str) -> Ordering {
    match (parse_marker(a), parse_marker(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// True when `candidate` was modified strictly after `reference`
pub fn is_newer(candidate: &str, reference: &str) -> bool {
    compare_markers(candidate, reference) == Ordering::Greater
}

fn pending_since<E: Synced>(items: Vec<E>, since: Option<&str>) -> Vec<E> {
    match since {
        None => items,
        Some(checkpoint) => items
            .into_iter()
            .filter(|item| is_newer(item.last_modified(), checkpoint))
            .collect(),
    }
}

/// Bundle the maps and KML overlays modified after `since`.
///
/// With no checkpoint every stored item is pending. Store order is kept.
pub fn collect_pending(storage: &Storage, since: Option<&str>) -> Result<SyncItems> {
    let maps = MapDataSource::new(storage.clone()).get_all()?;
    let kmls = KmlDataSource::new(storage.clone()).get_all()?;

    let items = SyncItems::new(pending_since(maps, since), pending_since(kmls, since));
    tracing::debug!(
        maps = items.maps().len(),
        kmls = items.kmls().len(),
        since = since.unwrap_or("<never>"),
        "Collected pending sync items"
    );
    Ok(items)
}
