//! TrailScribe - field-mapping data layer
//!
//! Local persistence for geo-tagged samples, offline maps and KML overlays,
//! and synchronization of maps and overlays with a remote endpoint.

pub mod error;
pub mod storage;
pub mod sync;
pub mod types;

pub use error::{Result, TrailScribeError};
pub use storage::{KmlDataSource, MapDataSource, SampleDataSource, Storage};
pub use sync::{SyncItems, SyncSession};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
