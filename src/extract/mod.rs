//! Pure field extractors. Each one owns exactly one top-level namespace key.

pub mod geometry;
pub mod lineage;
pub mod measurements;
pub mod properties;

pub use geometry::extract_geometry;
pub use lineage::extract_lineage;
pub use measurements::{GridGroup, extract_measurements};
pub use properties::{PropertyOffsets, extract_properties};

/// A single extractor's output: `{ <owned key>: <value> }`, or empty.
pub type Fragment = serde_json::Map<String, serde_json::Value>;
