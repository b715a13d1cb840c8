use crate::dataset::DatasetRecord;
use crate::extract::Fragment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const KEY: &str = "measurements";

/// Measurements sharing one spatial sampling grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridGroup {
    pub grid: String,
    #[serde(default)]
    pub measurements: Vec<String>,
}

/// `{"measurements": {<name>: {"path", "band", "layer", "grid"}}}`.
///
/// Measurements named in `band_grids` get that group's label; all others keep
/// the grid carried by the record.
pub fn extract_measurements(record: &DatasetRecord, band_grids: Option<&[GridGroup]>) -> Fragment {
    let grid_of: HashMap<&str, &str> = band_grids
        .unwrap_or_default()
        .iter()
        .flat_map(|g| g.measurements.iter().map(|m| (m.as_str(), g.grid.as_str())))
        .collect();

    let mut measurements = serde_json::Map::new();
    for (name, desc) in &record.measurements {
        let grid = grid_of.get(name.as_str()).copied().unwrap_or(desc.grid.as_str());
        measurements.insert(
            name.clone(),
            serde_json::json!({
                "path": desc.path,
                "band": desc.band,
                "layer": desc.layer,
                "grid": grid,
            }),
        );
    }

    let mut out = Fragment::new();
    out.insert(KEY.to_string(), serde_json::Value::Object(measurements));
    out
}
