//! Schema Registry
//!
//! Resolves schema identifiers to their ordered field declarations.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{RemapError, Result};
use crate::schema::{FieldDescriptor, SchemaDefinition, SchemaId};

/// Lookup interface over the schemas known to the host
pub trait SchemaRegistry {
    /// Ordered field descriptors of a schema, in declaration order
    fn list_field_descriptors(&self, schema: &SchemaId) -> Result<Vec<FieldDescriptor>>;

    /// Every schema identifier the registry knows about
    fn list_all_schema_ids(&self) -> Vec<SchemaId>;
}

/// Registry backed by schema definitions held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    /// Definitions in registration order
    schemas: Vec<SchemaDefinition>,
    /// Position of each definition by id
    index: HashMap<SchemaId, usize>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions, rejecting duplicates
    pub fn from_definitions(definitions: impl IntoIterator<Item = SchemaDefinition>) -> Result<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Register a schema definition
    ///
    /// Registration is append-only - an existing id cannot be redefined
    pub fn register(&mut self, definition: SchemaDefinition) -> Result<()> {
        if self.contains(&definition.id) {
            return Err(RemapError::SchemaAlreadyExists(definition.id));
        }
        debug!(schema = %definition.id, fields = definition.fields.len(), "registered schema");
        self.index.insert(definition.id.clone(), self.schemas.len());
        self.schemas.push(definition);
        Ok(())
    }

    /// Get a definition by id
    pub fn get(&self, schema: &SchemaId) -> Option<&SchemaDefinition> {
        self.index.get(schema).map(|&i| &self.schemas[i])
    }

    /// Get a definition by id, failing with `SchemaNotFound`
    pub fn definition(&self, schema: &SchemaId) -> Result<&SchemaDefinition> {
        self.get(schema)
            .ok_or_else(|| RemapError::SchemaNotFound(schema.clone()))
    }

    pub fn contains(&self, schema: &SchemaId) -> bool {
        self.index.contains_key(schema)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> &[SchemaDefinition] {
        &self.schemas
    }
}

impl SchemaRegistry for InMemoryRegistry {
    fn list_field_descriptors(&self, schema: &SchemaId) -> Result<Vec<FieldDescriptor>> {
        Ok(self.definition(schema)?.descriptors())
    }

    fn list_all_schema_ids(&self) -> Vec<SchemaId> {
        self.schemas.iter().map(|s| s.id.clone()).collect()
    }
}
