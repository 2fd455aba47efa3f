//! The unit exchanged with a remote endpoint in one sync round

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Kml, Map};

/// Maps and KML overlays pending exchange.
///
/// The payload does no filtering of its own; callers decide what goes in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncItems {
    #[serde(default)]
    maps: Vec<Map>,
    #[serde(default)]
    kmls: Vec<Kml>,
}

impl SyncItems {
    pub fn new(maps: Vec<Map>, kmls: Vec<Kml>) -> Self {
        Self { maps, kmls }
    }

    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    pub fn kmls(&self) -> &[Kml] {
        &self.kmls
    }

    /// Replace the whole map sequence
    pub fn set_maps(&mut self, maps: Vec<Map>) {
        self.maps = maps;
    }

    /// Replace the whole KML sequence
    pub fn set_kmls(&mut self, kmls: Vec<Kml>) {
        self.kmls = kmls;
    }

    pub fn into_parts(self) -> (Vec<Map>, Vec<Kml>) {
        (self.maps, self.kmls)
    }

    pub fn len(&self) -> usize {
        self.maps.len() + self.kmls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty() && self.kmls.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
