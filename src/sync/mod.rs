//! Synchronization of maps and KML overlays with a remote endpoint
//!
//! The payload ([`SyncItems`]) only bundles items. Deciding what is pending
//! is done by comparing last-modified markers against the checkpoint of the
//! previous round; the exchange itself goes through a [`SyncTransport`].

mod checkpoint;
mod payload;
mod planner;
mod session;
mod transport;

pub use checkpoint::{get_sync_status, record_sync_failure, record_sync_success};
pub use payload::SyncItems;
pub use planner::{collect_pending, compare_markers, is_newer, Synced};
pub use session::{ReconcileStats, SyncReport, SyncSession};
pub use transport::{JsonFileTransport, SyncTransport};
