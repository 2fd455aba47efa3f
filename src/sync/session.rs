//! One synchronization round: collect, exchange, reconcile, checkpoint

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::checkpoint::{get_sync_status, record_sync_failure, record_sync_success};
use super::payload::SyncItems;
use super::planner::{collect_pending, is_newer, Synced};
use super::transport::SyncTransport;
use crate::error::{Result, TrailScribeError};
use crate::storage::{DataSource, KmlDataSource, MapDataSource, Storage};
use crate::types::SyncStatus;

/// What happened to incoming items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Unknown locally, stored as new rows
    pub inserted: usize,
    /// Remote copy was newer and replaced the local one
    pub updated: usize,
    /// Local copy was as new or newer
    pub kept_local: usize,
    /// No filename to match on, or rejected by validation
    pub skipped: usize,
}

/// Outcome of a completed round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub sent_maps: usize,
    pub sent_kmls: usize,
    pub received: ReconcileStats,
    /// Checkpoint recorded for the next round
    pub checkpoint: String,
}

/// Sync orchestration over one store
#[derive(Clone)]
pub struct SyncSession {
    storage: Storage,
    maps: MapDataSource,
    kmls: KmlDataSource,
}

impl SyncSession {
    pub fn new(storage: Storage) -> Self {
        Self {
            maps: MapDataSource::new(storage.clone()),
            kmls: KmlDataSource::new(storage.clone()),
            storage,
        }
    }

    pub fn status(&self) -> Result<SyncStatus> {
        self.storage.with_connection(get_sync_status)
    }

    /// Items modified since the last successful round
    pub fn pending(&self) -> Result<SyncItems> {
        let status = self.status()?;
        collect_pending(&self.storage, status.last_sync.as_deref())
    }

    /// Merge a remote payload into the local store.
    ///
    /// Items are matched by filename. Unknown items are inserted, a newer
    /// remote copy overwrites the local row, otherwise the local copy wins.
    pub fn apply(&self, incoming: SyncItems) -> Result<ReconcileStats> {
        let (maps, kmls) = incoming.into_parts();
        let mut stats = ReconcileStats::default();
        reconcile(&self.maps, maps, &mut stats)?;
        reconcile(&self.kmls, kmls, &mut stats)?;
        tracing::debug!(?stats, "Applied incoming sync items");
        Ok(stats)
    }

    /// Run one round against the transport.
    ///
    /// The checkpoint is the round's start time, so edits made while the
    /// round is in flight are picked up next time. A transport failure is
    /// recorded and returned; the previous checkpoint stays.
    pub fn run<T: SyncTransport + ?Sized>(&self, transport: &T) -> Result<SyncReport> {
        let checkpoint = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let outgoing = self.pending()?;
        let (sent_maps, sent_kmls) = (outgoing.maps().len(), outgoing.kmls().len());

        let incoming = match transport.exchange(&outgoing) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::error!("Sync exchange failed: {}", e);
                self.storage
                    .with_connection(|conn| record_sync_failure(conn, &e.to_string()))?;
                return Err(e);
            }
        };

        let received = self.apply(incoming)?;
        self.storage
            .with_connection(|conn| record_sync_success(conn, &checkpoint))?;

        tracing::info!(
            sent_maps,
            sent_kmls,
            inserted = received.inserted,
            updated = received.updated,
            kept_local = received.kept_local,
            "Sync round completed"
        );

        Ok(SyncReport {
            sent_maps,
            sent_kmls,
            received,
            checkpoint,
        })
    }
}

enum Outcome {
    Inserted,
    Updated,
    KeptLocal,
}

fn reconcile<E: Synced>(
    source: &DataSource<E>,
    incoming: Vec<E>,
    stats: &mut ReconcileStats,
) -> Result<()> {
    for mut remote in incoming {
        if remote.meta().filename.is_empty() {
            tracing::warn!(
                kind = %source.kind(),
                name = %remote.meta().name,
                "Skipping incoming item without filename"
            );
            stats.skipped += 1;
            continue;
        }

        let outcome = match source.find_by_filename(&remote.meta().filename)? {
            None => source.insert(&remote).map(|_| Outcome::Inserted),
            Some(local) if is_newer(remote.last_modified(), local.last_modified()) => {
                remote.meta_mut().id = local.meta().id;
                source.update(&remote).map(|_| Outcome::Updated)
            }
            Some(_) => Ok(Outcome::KeptLocal),
        };

        match outcome {
            Ok(Outcome::Inserted) => stats.inserted += 1,
            Ok(Outcome::Updated) => stats.updated += 1,
            Ok(Outcome::KeptLocal) => stats.kept_local += 1,
            Err(TrailScribeError::InvalidInput(reason)) => {
                tracing::warn!(
                    kind = %source.kind(),
                    filename = %remote.meta().filename,
                    %reason,
                    "Skipping invalid incoming item"
                );
                stats.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Map, SyncMetadata};
    use std::cell::RefCell;

    fn map(file: &str, modified: &str) -> Map {
        Map::try_new(
            SyncMetadata::new(file, file),
            "",
            "EPSG:4326",
            (1, 12),
            BoundingBox::new(-122.06, 37.40, -122.05, 37.42).unwrap(),
            modified,
        )
        .unwrap()
    }

    struct Recording {
        reply: SyncItems,
        sent: RefCell<Vec<SyncItems>>,
    }

    impl SyncTransport for Recording {
        fn exchange(&self, outgoing: &SyncItems) -> Result<SyncItems> {
            self.sent.borrow_mut().push(outgoing.clone());
            Ok(self.reply.clone())
        }
    }

    struct Offline;

    impl SyncTransport for Offline {
        fn exchange(&self, _outgoing: &SyncItems) -> Result<SyncItems> {
            Err(TrailScribeError::Sync("network unreachable".into()))
        }
    }

    #[test]
    fn test_apply_inserts_updates_and_keeps_local() {
        let session = SyncSession::new(Storage::open_in_memory().unwrap());
        let maps = MapDataSource::new(session.storage.clone());
        maps.insert(&map("stale.mbtiles", "2014-01-01T00:00:00Z"))
            .unwrap();
        maps.insert(&map("fresh.mbtiles", "2014-09-01T00:00:00Z"))
            .unwrap();

        let mut remote_stale = map("stale.mbtiles", "2014-05-01T00:00:00Z");
        remote_stale.description = "re-rendered".into();
        let incoming = SyncItems::new(
            vec![
                remote_stale,
                map("fresh.mbtiles", "2014-02-01T00:00:00Z"),
                map("brand-new.mbtiles", "2014-03-01T00:00:00Z"),
            ],
            Vec::new(),
        );

        let stats = session.apply(incoming).unwrap();
        assert_eq!(
            stats,
            ReconcileStats {
                inserted: 1,
                updated: 1,
                kept_local: 1,
                skipped: 0
            }
        );

        let updated = maps.find_by_filename("stale.mbtiles").unwrap().unwrap();
        assert_eq!(updated.description, "re-rendered");
        assert_eq!(maps.count().unwrap(), 3);
    }

    #[test]
    fn test_remote_timestamp_replaces_placeholder_copy() {
        let session = SyncSession::new(Storage::open_in_memory().unwrap());
        let maps = MapDataSource::new(session.storage.clone());
        let mut local = map("moffett.mbtiles", "default last modified");
        local.description = "local".into();
        maps.insert(&local).unwrap();

        let mut remote = map("moffett.mbtiles", "2026-10-01T00:00:00Z");
        remote.description = "remote".into();
        let stats = session
            .apply(SyncItems::new(vec![remote], Vec::new()))
            .unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.kept_local, 0);

        let stored = maps.find_by_filename("moffett.mbtiles").unwrap().unwrap();
        assert_eq!(stored.description, "remote");
        assert_eq!(stored.last_modified, "2026-10-01T00:00:00Z");
    }

    #[test]
    fn test_apply_skips_unmatchable_and_invalid_items() {
        let session = SyncSession::new(Storage::open_in_memory().unwrap());
        let mut nameless = map("", "2014-01-01T00:00:00Z");
        nameless.meta.name = "no file".into();
        let mut inverted = map("bad.mbtiles", "2014-01-01T00:00:00Z");
        inverted.min_zoom_level = 15;

        let stats = session
            .apply(SyncItems::new(vec![nameless, inverted], Vec::new()))
            .unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(MapDataSource::new(session.storage.clone()).count().unwrap(), 0);
    }

    #[test]
    fn test_run_sends_only_changes_since_checkpoint() {
        let session = SyncSession::new(Storage::open_in_memory().unwrap());
        let maps = MapDataSource::new(session.storage.clone());
        maps.insert(&map("old.mbtiles", "2014-01-01T00:00:00Z")).unwrap();

        let transport = Recording {
            reply: SyncItems::default(),
            sent: RefCell::new(Vec::new()),
        };
        let first = session.run(&transport).unwrap();
        assert_eq!(first.sent_maps, 1);
        assert_eq!(
            session.status().unwrap().last_sync.as_deref(),
            Some(first.checkpoint.as_str())
        );

        // Nothing changed since the checkpoint
        let second = session.run(&transport).unwrap();
        assert_eq!(second.sent_maps, 0);
        assert_eq!(transport.sent.borrow().len(), 2);
    }

    #[test]
    fn test_run_failure_is_recorded_and_returned() {
        let session = SyncSession::new(Storage::open_in_memory().unwrap());
        let err = session.run(&Offline).unwrap_err();
        assert!(matches!(err, TrailScribeError::Sync(_)));

        let status = session.status().unwrap();
        assert!(status.last_sync.is_none());
        assert!(status.last_error.unwrap().contains("network unreachable"));
    }
}
