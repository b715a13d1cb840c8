//! The merged, per-dataset set of extracted fields that templates draw on.

use crate::error::TransformError;
use crate::extract::Fragment;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace(serde_json::Map<String, Value>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unite an extractor's output into the namespace.
    ///
    /// Extractors own disjoint keys; a repeated key is a bug in the caller.
    pub fn merge(&mut self, fragment: Fragment) -> Result<(), TransformError> {
        for (key, value) in fragment {
            debug_assert!(!self.0.contains_key(&key), "namespace key collision on `{}`", key);
            if self.0.contains_key(&key) {
                return Err(TransformError::NamespaceCollision(key));
            }
            self.0.insert(key, value);
        }
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Resolve a dot-separated key path such as `properties.odc:creation_datetime`
    /// or `geometry.coordinates.0`. Array elements are addressed by index.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.0.get(segments.next()?)?;
        segments.try_fold(first, |cur, seg| match cur {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fragment(v: Value) -> Fragment {
        match v {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn merges_disjoint_fragments() {
        let mut ns = Namespace::new();
        ns.merge(fragment(json!({"properties": {"datetime": "t"}})))
            .unwrap();
        ns.merge(fragment(json!({"lineage": {}}))).unwrap();
        ns.merge(Fragment::new()).unwrap();
        assert_eq!(ns.keys().collect::<Vec<_>>(), vec!["lineage", "properties"]);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "namespace key collision"))]
    fn collision_is_rejected() {
        let mut ns = Namespace::new();
        ns.merge(fragment(json!({"lineage": {}}))).unwrap();
        let err = ns.merge(fragment(json!({"lineage": {"pq": []}}))).unwrap_err();
        assert!(matches!(err, TransformError::NamespaceCollision(k) if k == "lineage"));
    }

    #[test]
    fn lookup_walks_objects_and_arrays() {
        let mut ns = Namespace::new();
        ns.merge(fragment(json!({
            "properties": {"odc:creation_datetime": "2018-05-01T10:11:12Z"},
            "measurements": {"blue": {"layer": null}},
            "geometry": {"coordinates": [[[1, 2]]]},
        })))
        .unwrap();

        assert_eq!(
            ns.lookup("properties.odc:creation_datetime"),
            Some(&json!("2018-05-01T10:11:12Z"))
        );
        assert_eq!(ns.lookup("measurements.blue.layer"), Some(&Value::Null));
        assert_eq!(ns.lookup("geometry.coordinates.0.0"), Some(&json!([1, 2])));
        assert_eq!(ns.lookup("measurements.red"), None);
        assert_eq!(ns.lookup("lineage"), None);
    }
}
