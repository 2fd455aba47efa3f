//! Sample table binding and development seed data

use rusqlite::types::Value;
use rusqlite::Row;

use super::data_source::{DataSource, Entity};
use crate::error::Result;
use crate::types::{Record, RecordKind, Sample, SyncMetadata};

/// Data source for field samples
pub type SampleDataSource = DataSource<Sample>;

/// Custom field value carried by every seeded sample
pub const DEFAULT_CUSTOM_FIELD: &str = "default custom field";

/// Bootstrap samples around the Moffett Field campus: (name, longitude, latitude)
const SEED_SAMPLES: &[(&str, f64, f64)] = &[
    (
        "Carnegie Mellon University: Silicon Valley Campus",
        -122.059746,
        37.410418,
    ),
    ("Hangar 1", -122.054195, 37.412675),
    ("Moffett Field Historical Society Museum", -122.054230, 37.411352),
    ("Pool", -122.056896, 37.409516),
];

impl Entity for Sample {
    const KIND: RecordKind = RecordKind::Sample;
    const TABLE: &'static str = "samples";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "filename",
        "description",
        "time",
        "x",
        "y",
        "z",
        "custom_field",
        "last_modified",
        "user_id",
        "map_id",
        "expedition_id",
    ];

    fn meta(&self) -> &SyncMetadata {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMetadata {
        &mut self.meta
    }

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(self.meta.name.clone())),
            ("filename", Value::Text(self.meta.filename.clone())),
            ("description", Value::Text(self.description.clone())),
            ("time", Value::Text(self.time.clone())),
            ("x", Value::Real(self.x)),
            ("y", Value::Real(self.y)),
            ("z", Value::Real(self.z)),
            ("custom_field", Value::Text(self.custom_field.clone())),
            ("last_modified", Value::Text(self.last_modified.clone())),
            ("user_id", Value::Integer(self.user_id)),
            ("map_id", Value::Integer(self.map_id)),
            ("expedition_id", Value::Integer(self.expedition_id)),
        ]
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Sample {
            meta: SyncMetadata {
                id: row.get("id")?,
                name: row.get("name")?,
                filename: row.get("filename")?,
            },
            description: row.get("description")?,
            time: row.get("time")?,
            x: row.get("x")?,
            y: row.get("y")?,
            z: row.get("z")?,
            custom_field: row.get("custom_field")?,
            last_modified: row.get("last_modified")?,
            user_id: row.get("user_id")?,
            map_id: row.get("map_id")?,
            expedition_id: row.get("expedition_id")?,
        })
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Sample(sample) => Some(sample),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        Sample::validate(self)
    }
}

/// The fixed development samples, unpersisted
pub fn default_samples() -> Vec<Sample> {
    SEED_SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (name, x, y))| Sample {
            meta: SyncMetadata::new(*name, ""),
            description: format!("sample #{}", i + 1),
            time: "default time".to_string(),
            x: *x,
            y: *y,
            z: 0.0,
            custom_field: DEFAULT_CUSTOM_FIELD.to_string(),
            last_modified: "default last modified".to_string(),
            user_id: 0,
            map_id: 0,
            expedition_id: 0,
        })
        .collect()
}

impl DataSource<Sample> {
    /// Populate an empty sample table with the development samples.
    ///
    /// Does nothing when the table already holds samples. Returns the number of
    /// samples inserted.
    pub fn seed_defaults(&self) -> Result<usize> {
        let samples = default_samples();
        let inserted = self.storage().with_transaction(|conn| {
            let existing: i64 = conn.query_row("SELECT COUNT(*) FROM samples", [], |row| {
                row.get(0)
            })?;
            if existing > 0 {
                return Ok(0);
            }
            for sample in &samples {
                super::data_source::insert_row(conn, Sample::TABLE, sample.to_values())?;
            }
            Ok(samples.len())
        })?;

        if inserted > 0 {
            tracing::info!(count = inserted, "Seeded development samples");
        } else {
            tracing::debug!("Sample table not empty, skipping seed");
        }
        Ok(inserted)
    }

    /// Samples captured on the given map
    pub fn get_by_map(&self, map_id: i64) -> Result<Vec<Sample>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|s| s.map_id == map_id)
            .collect())
    }
}
