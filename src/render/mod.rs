//! Template substitution and validation of the rendered result.

pub mod template;

pub use template::{Placeholder, Template};

use serde::de::Error as _;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A required placeholder names a path the namespace cannot supply.
    #[error("unresolved placeholder `{path}` at template line {line}")]
    Unresolved { path: String, line: usize },

    #[error("cannot encode value for `{path}`: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse rendered text as structured data.
///
/// The result must be a mapping with string keys; anything else is treated as
/// a malformed document.
pub fn parse_rendered(text: &str) -> Result<serde_json::Value, serde_yaml::Error> {
    let value: serde_json::Value = serde_yaml::from_str(text)?;
    if !value.is_object() {
        return Err(serde_yaml::Error::custom(
            "rendered document must be a mapping at the top level",
        ));
    }
    Ok(value)
}

/// Canonical, key-ordered YAML text for a parsed document.
pub fn to_canonical_yaml(doc: &serde_json::Value) -> Result<String, serde_yaml::Error> {
    // serde_json maps are BTreeMaps here, so keys come out sorted at every level.
    serde_yaml::to_string(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_output_sorts_keys() {
        let doc = parse_rendered("zeta: 1\nalpha:\n  y: 2\n  b: [3]\n").unwrap();
        let text = to_canonical_yaml(&doc).unwrap();
        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("alpha:") < pos("zeta:"));
        assert!(pos("b:") < pos("y:"));
        assert_eq!(parse_rendered(&text).unwrap(), doc);
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(parse_rendered("just text\n").is_err());
    }

    #[test]
    fn broken_flow_mapping_is_rejected() {
        assert!(parse_rendered("geometry: {\"type\": \"Polygon\"\n").is_err());
    }
}
