use crate::extract::Fragment;
use crate::provenance::ProvenanceEdge;
use std::collections::BTreeMap;

pub const KEY: &str = "lineage";

/// `{"lineage": {<classifier>: [<source id>, ...]}}`.
///
/// Source ids keep the order the edges arrived in within each classifier.
pub fn extract_lineage(edges: &[ProvenanceEdge]) -> Fragment {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in edges {
        groups
            .entry(edge.classifier.as_str())
            .or_default()
            .push(edge.source_id.as_str());
    }

    let mut out = Fragment::new();
    out.insert(KEY.to_string(), serde_json::json!(groups));
    out
}
