//! KML overlay table binding

use rusqlite::types::Value;
use rusqlite::Row;

use super::data_source::{DataSource, Entity};
use super::map_source::{bounds_from_row, bounds_values};
use crate::error::Result;
use crate::types::{Kml, Record, RecordKind, SyncMetadata};

/// Data source for KML overlays
pub type KmlDataSource = DataSource<Kml>;

impl Entity for Kml {
    const KIND: RecordKind = RecordKind::Kml;
    const TABLE: &'static str = "kmls";
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
        Ok(Kml {
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
            Record::Kml(kml) => Some(kml),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        Kml::validate(self)
    }
}
