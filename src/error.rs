//! Per-file error taxonomy.
//!
//! Every variant is fatal for the file being transformed and never for the
//! batch: the pipeline records it next to the offending path and moves on.

use std::path::PathBuf;

use crate::render::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A required field is absent on the raw dataset record.
    #[error("missing attribute `{0}`")]
    MissingAttribute(&'static str),

    /// A field is present but cannot be interpreted.
    #[error("invalid attribute `{attribute}`: {reason}")]
    InvalidAttribute {
        attribute: &'static str,
        reason: String,
    },

    /// The provenance query against the catalog index could not run.
    #[error("catalog index unavailable: {0}")]
    IndexUnavailable(#[from] IndexError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The rendered template is not well-formed YAML data.
    #[error("rendered document failed to parse: {0}")]
    ParseValidation(#[source] serde_yaml::Error),

    /// Two extractors produced the same top-level key.
    #[error("namespace key collision on `{0}`")]
    NamespaceCollision(String),

    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata document itself is not decodable.
    #[error("decode metadata document: {0}")]
    Decode(#[source] serde_yaml::Error),

    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn invalid(attribute: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute,
            reason: reason.into(),
        }
    }

    /// Short stable label used in logs and batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingAttribute(_) => "missing-attribute",
            Self::InvalidAttribute { .. } => "invalid-attribute",
            Self::IndexUnavailable(_) => "index-unavailable",
            Self::Render(_) => "render",
            Self::ParseValidation(_) => "parse-validation",
            Self::NamespaceCollision(_) => "namespace-collision",
            Self::Read { .. } => "read",
            Self::Decode(_) => "decode",
            Self::Write { .. } => "write",
        }
    }
}

/// Failures reaching the catalog's source-relationship store.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("cannot open catalog export {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog export {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("source query failed: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attribute_display() {
        let err = TransformError::MissingAttribute("extent.center_dt");
        assert_eq!(err.to_string(), "missing attribute `extent.center_dt`");
        assert_eq!(err.kind(), "missing-attribute");
    }

    #[test]
    fn index_error_converts() {
        let err: TransformError = IndexError::Query("relation does not exist".into()).into();
        assert!(matches!(err, TransformError::IndexUnavailable(_)));
        assert!(err.to_string().contains("relation does not exist"));
    }
}
