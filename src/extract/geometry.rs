use crate::dataset::DatasetRecord;
use crate::extract::Fragment;

pub const KEY: &str = "geometry";

/// `{"geometry": {"type", "coordinates"}}`, or an empty fragment when the
/// record has no footprint. The key is omitted, never null.
pub fn extract_geometry(record: &DatasetRecord) -> Fragment {
    let mut out = Fragment::new();
    if let Some(geom) = &record.geometry {
        out.insert(
            KEY.to_string(),
            serde_json::json!({
                "type": geom.kind,
                "coordinates": geom.coordinates,
            }),
        );
    }
    out
}
