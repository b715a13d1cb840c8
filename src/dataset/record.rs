use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Grid label carried by bands that do not name one.
pub const DEFAULT_GRID: &str = "default";

/// Spatial footprint in GeoJSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: serde_json::Value,
}

/// One measurement's storage location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandDescriptor {
    pub path: String,
    pub band: u32,
    pub layer: Option<String>,
    pub grid: String,
}

/// A decoded dataset. Read-only once loaded.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub measurements: BTreeMap<String, BandDescriptor>,
    /// Capture (acquisition centre) time.
    pub time: Option<DateTime<Utc>>,
    /// Time the dataset was created/indexed.
    pub indexed_time: Option<DateTime<Utc>>,
    /// The whole source document, addressed by property offsets.
    pub document: serde_yaml::Value,
}
