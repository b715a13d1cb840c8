//! Dataset records decoded from `ga-metadata.yaml` documents.

pub mod load;
pub mod record;

pub use load::{decode_dataset, load_dataset};
pub use record::{BandDescriptor, DEFAULT_GRID, DatasetRecord, Geometry};
