//! Map table binding

use rusqlite::types::Value;
use rusqlite::Row;

use super::data_source::{DataSource, Entity};
use crate::error::Result;
use crate::types::{BoundingBox, Map, Record, RecordKind, SyncMetadata};

/// Data source for offline tile sets
pub type MapDataSource = DataSource<Map>;

/// Bounding-box columns shared by the map and KML tables
pub(super) fn bounds_values(bounds: &BoundingBox) -> [(&'static str, Value); 4] {
    [
        ("min_x", Value::Real(bounds.min_x)),
        ("min_y", Value::Real(bounds.min_y)),
        ("max_x", Value::Real(bounds.max_x)),
        ("max_y", Value::Real(bounds.max_y)),
    ]
}

pub(super) fn bounds_from_row(row: &Row) -> rusqlite::Result<BoundingBox> {
    Ok(BoundingBox {
        min_x: row.get("min_x")?,
        min_y: row.get("min_y")?,
        max_x: row.get("max_x")?,
        max_y: row.get("max_y")?,
    })
}

impl Entity for Map {
    const KIND: RecordKind = RecordKind::Map;
    const TABLE: &'static str = "maps";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "filename",
        "description",
        "projection",
        "min_zoom_level",
        "max_zoom_level",
        "min_x",
        "min_y",
        "max_x",
        "max_y",
        "last_modified",
    ];

    fn meta(&self) -> &SyncMetadata {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMetadata {
        &mut self.meta
    }

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        let mut values = vec![
            ("name", Value::Text(self.meta.name.clone())),
            ("filename", Value::Text(self.meta.filename.clone())),
            ("description", Value::Text(self.description.clone())),
            ("projection", Value::Text(self.projection.clone())),
            ("min_zoom_level", Value::Integer(self.min_zoom_level.into())),
            ("max_zoom_level", Value::Integer(self.max_zoom_level.into())),
        ];
        values.extend(bounds_values(&self.bounds));
        values.push(("last_modified", Value::Text(self.last_modified.clone())));
        values
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Map {
            meta: SyncMetadata {
                id: row.get("id")?,
                name: row.get("name")?,
                filename: row.get("filename")?,
            },
            description: row.get("description")?,
            projection: row.get("projection")?,
            min_zoom_level: row.get("min_zoom_level")?,
            max_zoom_level: row.get("max_zoom_level")?,
            bounds: bounds_from_row(row)?,
            last_modified: row.get("last_modified")?,
        })
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Map(map) => Some(map),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        Map::validate(self)
    }
}
