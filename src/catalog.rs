//! Catalog snapshots
//!
//! A catalog bundles schema definitions and records as JSON so the CLI and
//! fixtures can stand up an [`InMemoryRegistry`] and a [`MemoryStore`].
//!
//! ```json
//! {
//!   "schemas": [
//!     { "id": "Unlit", "fields": [
//!       { "name": "_Color", "type": "color" },
//!       { "name": "_Cutoff", "type": "range", "default": { "scalar": 0.5 } }
//!     ] }
//!   ],
//!   "records": [
//!     { "id": "materials/red.mat", "schema": "Unlit",
//!       "values": { "_Color": { "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 } } } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::registry::InMemoryRegistry;
use crate::schema::SchemaDefinition;
use crate::store::{MemoryRecord, MemoryStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub schemas: Vec<SchemaDefinition>,
    #[serde(default)]
    pub records: Vec<MemoryRecord>,
}

impl Catalog {
    /// Parse a catalog from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let catalog = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(
            path = %path.display(),
            schemas = catalog.schemas.len(),
            records = catalog.records.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Write the catalog as JSON
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let content = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Build the registry and store described by this catalog
    pub fn into_parts(self) -> Result<(Arc<InMemoryRegistry>, MemoryStore)> {
        let registry = Arc::new(InMemoryRegistry::from_definitions(self.schemas)?);
        let store = MemoryStore::with_records(registry.clone(), self.records)?;
        Ok((registry, store))
    }

    /// Snapshot a store (and the registry it validates against)
    pub fn from_store(store: &MemoryStore) -> Self {
        Self {
            schemas: store.registry().definitions().to_vec(),
            records: store.records().to_vec(),
        }
    }
}
