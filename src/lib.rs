//! Transform per-dataset `ga-metadata.yaml` documents into templated,
//! validated metadata documents.
//!
//! For every document found under an input root the pipeline extracts the
//! footprint, measurements, properties and immediate-parent lineage, merges
//! them into a [`namespace::Namespace`], renders a template, validates the
//! result as YAML data and writes it in canonical key order.

pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod locate;
pub mod namespace;
pub mod output;
pub mod pipeline;
pub mod provenance;
pub mod render;

pub type Result<T> = anyhow::Result<T>;
