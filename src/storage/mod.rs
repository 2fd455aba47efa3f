//! Storage engine for TrailScribe
//!
//! Handles SQLite connections, schema management and the per-entity data
//! sources.

mod connection;
mod data_source;
mod kml_source;
mod map_source;
mod migrations;
mod sample_source;

pub use connection::Storage;
pub use data_source::{DataSource, Entity};
pub use kml_source::KmlDataSource;
pub use map_source::MapDataSource;
pub use migrations::SCHEMA_VERSION;
pub use sample_source::{default_samples, SampleDataSource, DEFAULT_CUSTOM_FIELD};
