//! Schema introspection
//!
//! Turns a schema identifier into the ordered list of typed fields it declares.

use tracing::debug;

use crate::checksum::Fingerprint;
use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::schema::{FieldDescriptor, SchemaId};

/// Read-only view over a [`SchemaRegistry`]
#[derive(Clone, Copy)]
pub struct SchemaIntrospector<'r> {
    registry: &'r dyn SchemaRegistry,
}

impl<'r> SchemaIntrospector<'r> {
    pub fn new(registry: &'r dyn SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Ordered field descriptors of `schema`, in native declaration order.
    ///
    /// Fails with `SchemaNotFound` if the identifier does not resolve.
    pub fn describe(&self, schema: &SchemaId) -> Result<Vec<FieldDescriptor>> {
        let fields = self.registry.list_field_descriptors(schema)?;
        debug!(schema = %schema, fields = fields.len(), "described schema");
        Ok(fields)
    }

    /// Fingerprint of the schema's current field list
    pub fn fingerprint(&self, schema: &SchemaId) -> Result<Fingerprint> {
        Ok(Fingerprint::of_fields(&self.describe(schema)?))
    }

    /// All schema identifiers, for target selection
    pub fn schema_ids(&self) -> Vec<SchemaId> {
        self.registry.list_all_schema_ids()
    }
}
