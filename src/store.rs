//! Record store
//!
//! Records are owned by the store; the remapping core only addresses them by id
//! through [`RecordStore`]. Field accessors are valid only for fields declared
//! by the schema a record is currently bound to.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{RemapError, Result};
use crate::registry::InMemoryRegistry;
use crate::schema::{FieldDeclaration, FieldType, SchemaId};
use crate::value::FieldValue;

/// Identifier of a record in the store (e.g., an asset path)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Accessor interface over a queryable collection of records
pub trait RecordStore {
    /// Every record currently bound to `schema`
    fn find_by_bound_schema(&self, schema: &SchemaId) -> Vec<RecordId>;

    /// The schema a record is currently bound to
    fn bound_schema(&self, record: &RecordId) -> Result<SchemaId>;

    /// Read a field of the record's current schema
    fn read_field(&self, record: &RecordId, name: &str, field_type: FieldType) -> Result<FieldValue>;

    /// Write a field of the record's current schema
    fn write_field(
        &mut self,
        record: &RecordId,
        name: &str,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<()>;

    /// Point the record at another schema; field values are not touched
    fn rebind(&mut self, record: &RecordId, schema: &SchemaId) -> Result<()>;
}

/// A record held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub schema: SchemaId,
    /// Stored values by field name; kept across rebinds
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

impl MemoryRecord {
    pub fn new(id: impl Into<String>, schema: impl Into<SchemaId>) -> Self {
        Self {
            id: RecordId::new(id),
            schema: schema.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// In-memory store that validates every access against the bound schema
#[derive(Debug, Clone)]
pub struct MemoryStore {
    registry: Arc<InMemoryRegistry>,
    records: Vec<MemoryRecord>,
    index: HashMap<RecordId, usize>,
}

impl MemoryStore {
    pub fn new(registry: Arc<InMemoryRegistry>) -> Self {
        Self {
            registry,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a store and insert every record
    pub fn with_records(
        registry: Arc<InMemoryRegistry>,
        records: impl IntoIterator<Item = MemoryRecord>,
    ) -> Result<Self> {
        let mut store = Self::new(registry);
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Add a record; its schema must be registered
    pub fn insert(&mut self, record: MemoryRecord) -> Result<()> {
        self.registry.definition(&record.schema)?;
        match self.index.get(&record.id) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> &Arc<InMemoryRegistry> {
        &self.registry
    }

    pub fn get(&self, record: &RecordId) -> Option<&MemoryRecord> {
        self.index.get(record).map(|&i| &self.records[i])
    }

    /// All records in insertion order
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    fn record(&self, record: &RecordId) -> Result<&MemoryRecord> {
        self.get(record)
            .ok_or_else(|| RemapError::RecordNotFound(record.clone()))
    }

    fn record_mut(&mut self, record: &RecordId) -> Result<&mut MemoryRecord> {
        match self.index.get(record) {
            Some(&i) => Ok(&mut self.records[i]),
            None => Err(RemapError::RecordNotFound(record.clone())),
        }
    }

    /// Resolve `name` against the record's bound schema, checking the accessor type
    fn declaration(
        &self,
        record: &MemoryRecord,
        name: &str,
        field_type: FieldType,
    ) -> Result<&FieldDeclaration> {
        let schema = self.registry.definition(&record.schema)?;
        let decl = schema.get_field(name).ok_or_else(|| {
            RemapError::field_access(
                record.id.clone(),
                name,
                format!("not declared by schema {}", record.schema),
            )
        })?;
        if !decl.field_type.is_compatible_with(field_type) {
            return Err(RemapError::field_access(
                record.id.clone(),
                name,
                format!("declared as {}, accessed as {}", decl.field_type, field_type),
            ));
        }
        Ok(decl)
    }
}

impl RecordStore for MemoryStore {
    fn find_by_bound_schema(&self, schema: &SchemaId) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|r| &r.schema == schema)
            .map(|r| r.id.clone())
            .collect()
    }

    fn bound_schema(&self, record: &RecordId) -> Result<SchemaId> {
        Ok(self.record(record)?.schema.clone())
    }

    fn read_field(&self, record: &RecordId, name: &str, field_type: FieldType) -> Result<FieldValue> {
        let rec = self.record(record)?;
        let decl = self.declaration(rec, name, field_type)?;
        // A value stored under a previous schema with another kind is shadowed by the default
        let value = rec
            .values
            .get(name)
            .filter(|v| v.fits(decl.field_type))
            .cloned()
            .unwrap_or_else(|| decl.default_value());
        trace!(record = %record, field = name, value = %value, "read field");
        Ok(value)
    }

    fn write_field(
        &mut self,
        record: &RecordId,
        name: &str,
        field_type: FieldType,
        value: FieldValue,
    ) -> Result<()> {
        let rec = self.record(record)?;
        let decl = self.declaration(rec, name, field_type)?;
        if !value.fits(decl.field_type) {
            return Err(RemapError::field_access(
                record.clone(),
                name,
                format!("{} value does not fit {} field", value.kind(), decl.field_type),
            ));
        }
        trace!(record = %record, field = name, value = %value, "write field");
        self.record_mut(record)?.values.insert(name.to_string(), value);
        Ok(())
    }

    fn rebind(&mut self, record: &RecordId, schema: &SchemaId) -> Result<()> {
        self.registry.definition(schema)?;
        self.record_mut(record)?.schema = schema.clone();
        Ok(())
    }
}
