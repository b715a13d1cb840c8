//! Transform configuration (YAML).
//!
//! ```yaml
//! metadata_filename: ga-metadata.yaml
//! output_filename: odc-metadata.yaml
//! band_grids:
//!   - grid: ir
//!     measurements: [nir, swir1, swir2]
//! property_offsets:
//!   eo:platform: [platform, code]
//! ```
//!
//! Every field is optional; command-line flags override the file names.

use crate::extract::properties::{CREATION_DATETIME, DATETIME};
use crate::extract::{GridGroup, PropertyOffsets};
use crate::locate::DEFAULT_METADATA_FILENAME;
use crate::output::DEFAULT_OUTPUT_FILENAME;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    pub metadata_filename: String,
    pub output_filename: String,
    pub band_grids: Vec<GridGroup>,
    pub property_offsets: PropertyOffsets,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            metadata_filename: DEFAULT_METADATA_FILENAME.to_string(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            band_grids: Vec::new(),
            property_offsets: PropertyOffsets::new(),
        }
    }
}

impl TransformConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings that would make the batch ambiguous or destructive.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (what, name) in [
            ("metadata_filename", &self.metadata_filename),
            ("output_filename", &self.output_filename),
        ] {
            if name.trim().is_empty() {
                bail!("{} must not be empty", what);
            }
            if name.contains('/') || name.contains('\\') {
                bail!("{} must be a bare file name, got {:?}", what, name);
            }
        }
        if self.metadata_filename == self.output_filename {
            bail!(
                "output_filename equals metadata_filename ({}); outputs would overwrite inputs",
                self.output_filename
            );
        }

        // Each measurement belongs to at most one grid.
        let mut owner: BTreeMap<&str, &str> = BTreeMap::new();
        for group in &self.band_grids {
            if group.grid.trim().is_empty() {
                bail!("band_grids entry has an empty grid label");
            }
            for m in &group.measurements {
                if let Some(prev) = owner.insert(m.as_str(), group.grid.as_str()) {
                    bail!(
                        "measurement {} is assigned to multiple grids: {} and {}",
                        m,
                        prev,
                        group.grid
                    );
                }
            }
        }

        for (name, path) in &self.property_offsets {
            if name == DATETIME || name == CREATION_DATETIME {
                bail!("property_offsets may not override {}", name);
            }
            if path.is_empty() {
                bail!("property_offsets entry {} has an empty path", name);
            }
        }

        Ok(())
    }

    pub fn band_grids(&self) -> Option<&[GridGroup]> {
        (!self.band_grids.is_empty()).then_some(self.band_grids.as_slice())
    }

    pub fn property_offsets(&self) -> Option<&PropertyOffsets> {
        (!self.property_offsets.is_empty()).then_some(&self.property_offsets)
    }
}
