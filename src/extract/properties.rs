use crate::dataset::DatasetRecord;
use crate::dataset::load::format_timestamp;
use crate::error::TransformError;
use crate::extract::Fragment;
use std::collections::BTreeMap;
use tracing::debug;

pub const KEY: &str = "properties";
pub const DATETIME: &str = "datetime";
pub const CREATION_DATETIME: &str = "odc:creation_datetime";

/// Property name -> key path into the raw document,
/// e.g. `eo:platform: [platform, code]`.
pub type PropertyOffsets = BTreeMap<String, Vec<String>>;

/// `{"properties": {"datetime", "odc:creation_datetime", ..offsets}}`.
///
/// Without offsets exactly the two time keys are produced.
pub fn extract_properties(
    record: &DatasetRecord,
    offsets: Option<&PropertyOffsets>,
) -> Result<Fragment, TransformError> {
    let time = record
        .time
        .as_ref()
        .ok_or(TransformError::MissingAttribute("extent.center_dt"))?;
    let indexed_time = record
        .indexed_time
        .as_ref()
        .ok_or(TransformError::MissingAttribute("creation_dt"))?;

    let mut props = serde_json::Map::new();
    for (name, path) in offsets.into_iter().flatten() {
        let Some(found) = resolve_offset(&record.document, path) else {
            debug!(dataset = %record.id, property = %name, "offset not present in document");
            continue;
        };
        match serde_json::to_value(found) {
            Ok(value) => {
                props.insert(name.clone(), value);
            }
            Err(err) => {
                debug!(dataset = %record.id, property = %name, error = %err, "offset value not representable");
            }
        }
    }
    props.insert(DATETIME.to_string(), format_timestamp(time).into());
    props.insert(CREATION_DATETIME.to_string(), format_timestamp(indexed_time).into());

    let mut out = Fragment::new();
    out.insert(KEY.to_string(), serde_json::Value::Object(props));
    Ok(out)
}

/// Walk `path` through mappings (by key) and sequences (by index).
/// A null leaf counts as absent.
fn resolve_offset<'a>(doc: &'a serde_yaml::Value, path: &[String]) -> Option<&'a serde_yaml::Value> {
    let found = path.iter().try_fold(doc, |cur, seg| match cur {
        serde_yaml::Value::Sequence(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(seg.as_str()),
    })?;
    (!found.is_null()).then_some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::decode_dataset;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"
id: a
creation_dt: 2018-05-01T10:11:12Z
extent:
  center_dt: 2013-04-17T23:52:18Z
platform:
  code: LANDSAT_8
instrument:
  name: null
processing_level: [L1, NBAR]
"#;

    #[test]
    fn exactly_two_keys_without_offsets() {
        let rec = decode_dataset(DOC).unwrap();
        let out = extract_properties(&rec, None).unwrap();
        assert_eq!(
            serde_json::Value::Object(out),
            serde_json::json!({
                "properties": {
                    "datetime": "2013-04-17T23:52:18Z",
                    "odc:creation_datetime": "2018-05-01T10:11:12Z",
                }
            })
        );
    }

    #[test]
    fn offsets_add_resolved_properties() {
        let rec = decode_dataset(DOC).unwrap();
        let offsets: PropertyOffsets = [
            ("eo:platform", vec!["platform", "code"]),
            ("eo:instrument", vec!["instrument", "name"]),
            ("odc:processing_level", vec!["processing_level", "1"]),
            ("gone", vec!["nowhere"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();

        let out = extract_properties(&rec, Some(&offsets)).unwrap();
        let props = out[KEY].as_object().unwrap();
        assert_eq!(props["eo:platform"], "LANDSAT_8");
        assert_eq!(props["odc:processing_level"], "NBAR");
        assert!(!props.contains_key("eo:instrument"));
        assert!(!props.contains_key("gone"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn missing_capture_time_fails() {
        let rec = decode_dataset("id: a\ncreation_dt: 2018-05-01T10:11:12Z\n").unwrap();
        let err = extract_properties(&rec, None).unwrap_err();
        assert!(matches!(err, TransformError::MissingAttribute("extent.center_dt")));
    }

    #[test]
    fn missing_indexing_time_fails() {
        let rec = decode_dataset("id: a\nextent:\n  center_dt: 2013-04-17T23:52:18Z\n").unwrap();
        let err = extract_properties(&rec, None).unwrap_err();
        assert!(matches!(err, TransformError::MissingAttribute("creation_dt")));
    }
}
