//! Core types for TrailScribe

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailScribeError};

/// Store-assigned identity of a persisted record
pub type RecordId = i64;

/// Identity and display fields shared by every synchronizable entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Local identity, 0 until the record is persisted
    #[serde(default)]
    pub id: RecordId,
    /// Display label
    pub name: String,
    /// Associated resource file
    #[serde(default)]
    pub filename: String,
}

impl SyncMetadata {
    /// Metadata for a record that has not been persisted yet
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            filename: filename.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// A geo-tagged sample captured in the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    #[serde(flatten)]
    pub meta: SyncMetadata,
    pub description: String,
    /// Capture time, as recorded by the device
    pub time: String,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Elevation
    pub z: f64,
    #[serde(default)]
    pub custom_field: String,
    pub last_modified: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub map_id: i64,
    #[serde(default)]
    pub expedition_id: i64,
}

impl Sample {
    /// Reject coordinates outside the WGS84 range
    pub fn validate(&self) -> Result<()> {
        if !(-180.0..=180.0).contains(&self.x) {
            return Err(TrailScribeError::InvalidInput(format!(
                "longitude {} out of range [-180, 180]",
                self.x
            )));
        }
        if !(-90.0..=90.0).contains(&self.y) {
            return Err(TrailScribeError::InvalidInput(format!(
                "latitude {} out of range [-90, 90]",
                self.y
            )));
        }
        if !self.z.is_finite() {
            return Err(TrailScribeError::InvalidInput(format!(
                "elevation {} is not finite",
                self.z
            )));
        }
        Ok(())
    }
}

/// Bounding box in a map's projection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let bounds = Self {
            min_x,
            min_y,
            max_x,
            max_y,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check that both axes are ordered; NaN edges fail the check
    pub fn validate(&self) -> Result<()> {
        if !(self.min_x <= self.max_x) {
            return Err(TrailScribeError::InvalidInput(format!(
                "minX {} is greater than maxX {}",
                self.min_x, self.max_x
            )));
        }
        if !(self.min_y <= self.max_y) {
            return Err(TrailScribeError::InvalidInput(format!(
                "minY {} is greater than maxY {}",
                self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// An offline tile set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    #[serde(flatten)]
    pub meta: SyncMetadata,
    #[serde(default)]
    pub description: String,
    /// Coordinate reference system identifier, e.g. "EPSG:4326"
    pub projection: String,
    pub min_zoom_level: i32,
    pub max_zoom_level: i32,
    #[serde(flatten)]
    pub bounds: BoundingBox,
    /// Compared against the remote copy to decide staleness
    pub last_modified: String,
}

impl Map {
    /// Build a map, rejecting inverted zoom bounds or bounding box
    pub fn try_new(
        meta: SyncMetadata,
        description: impl Into<String>,
        projection: impl Into<String>,
        zoom_levels: (i32, i32),
        bounds: BoundingBox,
        last_modified: impl Into<String>,
    ) -> Result<Self> {
        let map = Self {
            meta,
            description: description.into(),
            projection: projection.into(),
            min_zoom_level: zoom_levels.0,
            max_zoom_level: zoom_levels.1,
            bounds,
            last_modified: last_modified.into(),
        };
        map.validate()?;
        Ok(map)
    }

    pub fn validate(&self) -> Result<()> {
        validate_zoom(self.min_zoom_level, self.max_zoom_level)?;
        self.bounds.validate()
    }
}

fn validate_zoom(min_zoom_level: i32, max_zoom_level: i32) -> Result<()> {
    if min_zoom_level > max_zoom_level {
        return Err(TrailScribeError::InvalidInput(format!(
            "minZoomLevel {} is greater than maxZoomLevel {}",
            min_zoom_level, max_zoom_level
        )));
    }
    Ok(())
}

/// Field-keyed text in the legacy client format.
///
/// Coordinates always carry a fractional part (`1.0`, not `1`). Very large or
/// small values use Rust's exponent notation (`1e20`), which differs from the
/// legacy `1.0E20`.
impl std::fmt::Display for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'projection':'{}','name':'{}','minZoomLevel':'{}','maxZoomLevel':'{}',\
             'minX':'{:?}','maxX':'{:?}','minY':'{:?}','maxY':'{:?}'",
            self.projection,
            self.meta.name,
            self.min_zoom_level,
            self.max_zoom_level,
            self.bounds.min_x,
            self.bounds.max_x,
            self.bounds.min_y,
            self.bounds.max_y
        )
    }
}

/// A vector overlay, synchronized the same way as a [`Map`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kml {
    #[serde(flatten)]
    pub meta: SyncMetadata,
    #[serde(default)]
    pub description: String,
    pub projection: String,
    pub min_zoom_level: i32,
    pub max_zoom_level: i32,
    #[serde(flatten)]
    pub bounds: BoundingBox,
    pub last_modified: String,
}

impl Kml {
    /// Build an overlay, rejecting inverted zoom bounds or bounding box
    pub fn try_new(
        meta: SyncMetadata,
        description: impl Into<String>,
        projection: impl Into<String>,
        zoom_levels: (i32, i32),
        bounds: BoundingBox,
        last_modified: impl Into<String>,
    ) -> Result<Self> {
        let kml = Self {
            meta,
            description: description.into(),
            projection: projection.into(),
            min_zoom_level: zoom_levels.0,
            max_zoom_level: zoom_levels.1,
            bounds,
            last_modified: last_modified.into(),
        };
        kml.validate()?;
        Ok(kml)
    }

    pub fn validate(&self) -> Result<()> {
        validate_zoom(self.min_zoom_level, self.max_zoom_level)?;
        self.bounds.validate()
    }
}

/// Kind of entity a data source manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Sample,
    Map,
    Kml,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sample => "sample",
            RecordKind::Map => "map",
            RecordKind::Kml => "kml",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any entity a data source can be handed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Sample(Sample),
    Map(Map),
    Kml(Kml),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Sample(_) => RecordKind::Sample,
            Record::Map(_) => RecordKind::Map,
            Record::Kml(_) => RecordKind::Kml,
        }
    }

    pub fn meta(&self) -> &SyncMetadata {
        match self {
            Record::Sample(s) => &s.meta,
            Record::Map(m) => &m.meta,
            Record::Kml(k) => &k.meta,
        }
    }
}

impl From<Sample> for Record {
    fn from(sample: Sample) -> Self {
        Record::Sample(sample)
    }
}

impl From<Map> for Record {
    fn from(map: Map) -> Self {
        Record::Map(map)
    }
}

impl From<Kml> for Record {
    fn from(kml: Kml) -> Self {
        Record::Kml(kml)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to SQLite database, or ":memory:"
    pub db_path: String,
    /// Storage mode (local or cloud-safe)
    #[serde(default)]
    pub storage_mode: StorageMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            storage_mode: StorageMode::Local,
        }
    }
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

/// Storage mode for SQLite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    /// WAL journal, for a database on local disk
    #[default]
    Local,
    /// DELETE journal, for a database inside a synced folder
    CloudSafe,
}

impl std::str::FromStr for StorageMode {
    type Err = TrailScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "wal" => Ok(StorageMode::Local),
            "cloud-safe" | "cloud_safe" | "cloudsafe" => Ok(StorageMode::CloudSafe),
            other => Err(TrailScribeError::Config(format!(
                "Unknown storage mode: {}",
                other
            ))),
        }
    }
}

/// Sync bookkeeping persisted alongside the records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Checkpoint of the last successful round (RFC 3339)
    pub last_sync: Option<String>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moffett_map(zoom: (i32, i32)) -> Result<Map> {
        let bounds = BoundingBox::new(-122.06, 37.40, -122.05, 37.42)?;
        Map::try_new(
            SyncMetadata::new("Moffett Field", "moffett.mbtiles"),
            "NASA Ames and surroundings",
            "EPSG:4326",
            zoom,
            bounds,
            "2014-03-01T10:00:00Z",
        )
    }

    #[test]
    fn test_map_accepts_ordered_bounds() {
        let map = moffett_map((1, 10)).unwrap();
        assert_eq!(map.min_zoom_level, 1);
        assert_eq!(map.max_zoom_level, 10);
        assert!(!map.meta.is_persisted());
    }

    #[test]
    fn test_map_rejects_inverted_zoom() {
        let err = moffett_map((10, 1)).unwrap_err();
        assert!(matches!(err, TrailScribeError::InvalidInput(_)));
    }

    #[test]
    fn test_bounding_box_rejects_inverted_axes() {
        assert!(BoundingBox::new(-122.05, 37.40, -122.06, 37.42).is_err());
        assert!(BoundingBox::new(-122.06, 37.42, -122.05, 37.40).is_err());
        assert!(BoundingBox::new(f64::NAN, 37.40, -122.05, 37.42).is_err());
        // Degenerate boxes are allowed
        assert!(BoundingBox::new(1.0, 1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_bounding_box_contains() {
        let bounds = BoundingBox::new(-122.06, 37.40, -122.05, 37.42).unwrap();
        assert!(bounds.contains(-122.055, 37.41));
        assert!(!bounds.contains(-122.07, 37.41));
    }

    #[test]
    fn test_map_display_is_field_keyed() {
        let map = moffett_map((1, 10)).unwrap();
        let text = map.to_string();
        assert!(text.starts_with("'projection':'EPSG:4326','name':'Moffett Field'"));
        assert!(text.contains("'minZoomLevel':'1','maxZoomLevel':'10'"));
        assert!(text.ends_with("'maxY':'37.42'"));
    }

    #[test]
    fn test_map_display_keeps_fractional_part() {
        let map = Map::try_new(
            SyncMetadata::new("Grid", "grid.mbtiles"),
            "",
            "EPSG:900913",
            (0, 4),
            BoundingBox::new(1.0, 2.0, 3.0, 4.0).unwrap(),
            "",
        )
        .unwrap();
        assert!(map
            .to_string()
            .ends_with("'minX':'1.0','maxX':'3.0','minY':'2.0','maxY':'4.0'"));
    }

    #[test]
    fn test_kml_try_new_validates_like_map() {
        let bounds = BoundingBox::new(-122.08, 37.38, -122.06, 37.41).unwrap();
        let meta = SyncMetadata::new("Stevens Creek", "stevens.kml");

        let kml = Kml::try_new(meta.clone(), "", "EPSG:4326", (2, 14), bounds, "").unwrap();
        assert_eq!((kml.min_zoom_level, kml.max_zoom_level), (2, 14));

        let err = Kml::try_new(meta, "", "EPSG:4326", (14, 2), bounds, "").unwrap_err();
        assert!(matches!(err, TrailScribeError::InvalidInput(_)));
    }

    #[test]
    fn test_kml_json_carries_zoom_bounds() {
        let json = r#"{"name":"Stevens Creek","filename":"stevens.kml","projection":"EPSG:4326",
            "minZoomLevel":2,"maxZoomLevel":14,"minX":-122.08,"minY":37.38,
            "maxX":-122.06,"maxY":37.41,"lastModified":"2014-05-10T08:00:00Z"}"#;
        let kml: Kml = serde_json::from_str(json).unwrap();
        assert_eq!(kml.min_zoom_level, 2);

        let value = serde_json::to_value(&kml).unwrap();
        assert_eq!(value["minZoomLevel"], 2);
        assert_eq!(value["maxZoomLevel"], 14);
    }

    #[test]
    fn test_map_json_uses_flat_camel_case_keys() {
        let map = moffett_map((1, 10)).unwrap();
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["name"], "Moffett Field");
        assert_eq!(value["filename"], "moffett.mbtiles");
        assert_eq!(value["minZoomLevel"], 1);
        assert_eq!(value["minX"], -122.06);
        assert_eq!(value["lastModified"], "2014-03-01T10:00:00Z");

        let back: Map = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_sample_coordinate_validation() {
        let mut sample = Sample {
            meta: SyncMetadata::new("Hangar 1", ""),
            description: "sample #2".into(),
            time: "default time".into(),
            x: -122.054195,
            y: 37.412675,
            z: 0.0,
            custom_field: String::new(),
            last_modified: String::new(),
            user_id: 0,
            map_id: 0,
            expedition_id: 0,
        };
        assert!(sample.validate().is_ok());

        sample.y = 91.0;
        assert!(sample.validate().is_err());

        sample.y = 37.0;
        sample.x = 180.5;
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_record_kind_and_meta() {
        let record: Record = moffett_map((1, 10)).unwrap().into();
        assert_eq!(record.kind(), RecordKind::Map);
        assert_eq!(record.meta().name, "Moffett Field");
        assert_eq!(record.kind().to_string(), "map");
    }

    #[test]
    fn test_storage_mode_parsing() {
        assert_eq!("local".parse::<StorageMode>().unwrap(), StorageMode::Local);
        assert_eq!(
            "Cloud-Safe".parse::<StorageMode>().unwrap(),
            StorageMode::CloudSafe
        );
        assert!("tape".parse::<StorageMode>().is_err());
    }
}
