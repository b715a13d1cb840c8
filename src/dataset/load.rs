use crate::dataset::record::{BandDescriptor, DEFAULT_GRID, DatasetRecord, Geometry};
use crate::error::TransformError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Raw document shape. Only the fields we extract are declared; the rest of
/// the document is kept verbatim on the record.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    creation_dt: Option<String>,

    #[serde(default)]
    extent: Option<RawExtent>,

    #[serde(default)]
    grid_spatial: Option<RawGridSpatial>,

    #[serde(default)]
    image: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawExtent {
    #[serde(default)]
    center_dt: Option<String>,

    #[serde(default)]
    from_dt: Option<String>,

    #[serde(default)]
    to_dt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGridSpatial {
    #[serde(default)]
    projection: Option<RawProjection>,
}

#[derive(Debug, Deserialize)]
struct RawProjection {
    #[serde(default)]
    valid_data: Option<RawGeometry>,

    #[serde(default)]
    geo_ref_points: Option<RawGeoRefPoints>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawGeoRefPoints {
    ul: RawPoint,
    ur: RawPoint,
    lr: RawPoint,
    ll: RawPoint,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    bands: BTreeMap<String, RawBand>,
}

#[derive(Debug, Deserialize)]
struct RawBand {
    path: String,

    #[serde(default)]
    band: Option<u32>,

    #[serde(default)]
    layer: Option<RawLayer>,

    #[serde(default)]
    grid: Option<String>,
}

/// Layers are written either by name or by index.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLayer {
    Name(String),
    Index(i64),
}

impl RawLayer {
    fn into_name(self) -> String {
        match self {
            RawLayer::Name(name) => name,
            RawLayer::Index(idx) => idx.to_string(),
        }
    }
}

/// Read and decode one metadata document.
pub fn load_dataset(path: &Path) -> Result<DatasetRecord, TransformError> {
    let text = fs::read_to_string(path).map_err(|source| TransformError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_dataset(&text)
}

/// Decode a metadata document already held in memory.
pub fn decode_dataset(text: &str) -> Result<DatasetRecord, TransformError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(TransformError::Decode)?;
    let raw: RawDocument =
        serde_yaml::from_value(document.clone()).map_err(TransformError::Decode)?;

    let id = raw
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(TransformError::MissingAttribute("id"))?;

    let time = raw.extent.map(capture_time).transpose()?.flatten();

    let indexed_time = raw
        .creation_dt
        .map(|s| parse_timestamp(&s).map_err(|e| TransformError::invalid("creation_dt", e)))
        .transpose()?;

    let geometry = raw
        .grid_spatial
        .and_then(|g| g.projection)
        .and_then(footprint);

    let measurements = raw
        .image
        .map(|img| img.bands)
        .unwrap_or_default()
        .into_iter()
        .map(|(name, band)| {
            let desc = BandDescriptor {
                path: band.path,
                band: band.band.unwrap_or(1),
                layer: band.layer.map(RawLayer::into_name),
                grid: band.grid.unwrap_or_else(|| DEFAULT_GRID.to_string()),
            };
            (name, desc)
        })
        .collect();

    Ok(DatasetRecord {
        id,
        geometry,
        measurements,
        time,
        indexed_time,
        document,
    })
}

/// Prefer the explicit valid-data polygon; fall back to the corner points.
/// `center_dt` when present, else the midpoint of `from_dt`..`to_dt`.
fn capture_time(extent: RawExtent) -> Result<Option<DateTime<Utc>>, TransformError> {
    let parse = |attribute: &'static str, s: String| {
        parse_timestamp(&s).map_err(|e| TransformError::invalid(attribute, e))
    };

    if let Some(center) = extent.center_dt {
        return parse("extent.center_dt", center).map(Some);
    }
    let (Some(from), Some(to)) = (extent.from_dt, extent.to_dt) else {
        return Ok(None);
    };
    let from = parse("extent.from_dt", from)?;
    let to = parse("extent.to_dt", to)?;
    if to < from {
        return Err(TransformError::invalid("extent.to_dt", "precedes extent.from_dt"));
    }
    Ok(Some(from + (to - from) / 2))
}

fn footprint(projection: RawProjection) -> Option<Geometry> {
    if let Some(valid) = projection.valid_data {
        return Some(Geometry {
            kind: valid.kind,
            coordinates: valid.coordinates,
        });
    }

    let pts = projection.geo_ref_points?;
    // Closed ring, ll -> ul -> ur -> lr -> ll.
    let ring: Vec<[f64; 2]> = [pts.ll, pts.ul, pts.ur, pts.lr, pts.ll]
        .iter()
        .map(|p| [p.x, p.y])
        .collect();
    Some(Geometry {
        kind: "Polygon".to_string(),
        coordinates: serde_json::json!([ring]),
    })
}

/// Accept RFC 3339, or a space/`T` separated naive time taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unrecognised timestamp {:?}", s))
}

/// Canonical text form used in rendered documents.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
