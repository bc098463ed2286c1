//! Name catalogs loaded from JSON
//!
//! A catalog declares the types and names an engine starts with:
//!
//! ```json
//! {
//!   "config": { "step_separator": ";" },
//!   "types": ["money"],
//!   "names": [
//!     { "type": "money", "name": "wallet", "cycle": "permanent", "init": 100, "min": 0 }
//!   ],
//!   "ordered": [ { "name": "tmp" } ]
//! }
//! ```

use crate::config::EngineConfig;
use crate::registry::{Bounds, ResetCycle};
use crate::NumenResult;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub config: Option<EngineConfig>,
    pub types: Vec<String>,
    pub names: Vec<NameEntry>,
    pub ordered: Vec<OrderedEntry>,
}

/// A typed name. A `raw_id` of 0 (or none) means "allocate the next one".
#[derive(Debug, Clone, Deserialize)]
pub struct NameEntry {
    #[serde(rename = "type", default)]
    pub type_label: String,
    pub name: String,
    #[serde(default)]
    pub raw_id: u32,
    #[serde(default)]
    pub cycle: ResetCycle,
    #[serde(flatten)]
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderedEntry {
    pub name: String,
    #[serde(default)]
    pub raw_id: u32,
    #[serde(flatten)]
    pub bounds: Bounds,
}

impl Catalog {
    pub fn from_json(text: &str) -> NumenResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> NumenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            crate::NumenError::Catalog(format!("cannot read '{}': {}", path.display(), err))
        })?;
        Self::from_json(&text)
    }
}
