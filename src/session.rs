//! Conversion sessions
//!
//! A session holds one [`SchemaMapping`] per source schema picked by the user.
//! After a clean conversion the mapping is replaced by a fresh one whose source
//! is the previous target, so another batch can be converted onward with an
//! empty override history. If the session already holds a mapping for that
//! target, the converted mapping is dropped and the existing one is kept.

use tracing::{debug, info};

use crate::convert::{ConversionExecutor, ConversionReport};
use crate::error::{RemapError, Result};
use crate::introspect::SchemaIntrospector;
use crate::mapping::SchemaMapping;
use crate::schema::SchemaId;
use crate::store::{RecordId, RecordStore};

pub struct ConversionSession {
    mappings: Vec<SchemaMapping>,
    executor: ConversionExecutor,
}

impl ConversionSession {
    /// Open a mapping for each distinct schema, in first-seen order
    pub fn open(
        introspector: &SchemaIntrospector<'_>,
        schemas: impl IntoIterator<Item = SchemaId>,
        executor: ConversionExecutor,
    ) -> Result<Self> {
        let mut mappings: Vec<SchemaMapping> = Vec::new();
        for schema in schemas {
            if mappings.iter().any(|m| m.source_schema() == &schema) {
                continue;
            }
            mappings.push(SchemaMapping::new(introspector, schema)?);
        }
        debug!(mappings = mappings.len(), "opened conversion session");
        Ok(Self { mappings, executor })
    }

    /// Open a session from a selection of schemas and records.
    ///
    /// Each selected record contributes the schema it is currently bound to.
    pub fn from_selection<S: RecordStore + ?Sized>(
        introspector: &SchemaIntrospector<'_>,
        store: &S,
        schemas: &[SchemaId],
        records: &[RecordId],
        executor: ConversionExecutor,
    ) -> Result<Self> {
        let mut selected = schemas.to_vec();
        for record in records {
            selected.push(store.bound_schema(record)?);
        }
        Self::open(introspector, selected, executor)
    }

    pub fn mappings(&self) -> &[SchemaMapping] {
        &self.mappings
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn position(&self, source: &SchemaId) -> Result<usize> {
        self.mappings
            .iter()
            .position(|m| m.source_schema() == source)
            .ok_or_else(|| RemapError::MappingNotFound(source.clone()))
    }

    pub fn mapping(&self, source: &SchemaId) -> Result<&SchemaMapping> {
        Ok(&self.mappings[self.position(source)?])
    }

    pub fn mapping_mut(&mut self, source: &SchemaId) -> Result<&mut SchemaMapping> {
        let i = self.position(source)?;
        Ok(&mut self.mappings[i])
    }

    /// Records that converting `source` would touch
    pub fn affected_records<S: RecordStore + ?Sized>(
        &self,
        source: &SchemaId,
        store: &S,
    ) -> Result<Vec<RecordId>> {
        self.position(source)?;
        Ok(store.find_by_bound_schema(source))
    }

    /// Convert every record bound to `source` using its mapping.
    ///
    /// When the report is clean, the mapping is replaced by a fresh one keyed
    /// to the target schema, or removed if the session already maps that
    /// schema. Otherwise it is kept so the remaining records can be retried.
    pub fn convert<S: RecordStore + ?Sized>(
        &mut self,
        source: &SchemaId,
        introspector: &SchemaIntrospector<'_>,
        store: &mut S,
    ) -> Result<ConversionReport> {
        let i = self.position(source)?;
        let report = self.executor.convert_bound(&self.mappings[i], store)?;

        if !report.is_clean() {
            return Ok(report);
        }

        if self.position(&report.target_schema).is_ok() {
            info!(
                previous = %source,
                existing = %report.target_schema,
                "mapping removed after conversion, target already open"
            );
            self.mappings.remove(i);
        } else {
            let next = SchemaMapping::new(introspector, report.target_schema.clone())?;
            info!(
                previous = %source,
                next = %report.target_schema,
                "mapping replaced after conversion"
            );
            self.mappings[i] = next;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::mapping::MappingState;
    use crate::registry::InMemoryRegistry;
    use crate::schema::{FieldType, SchemaDefinition};
    use crate::store::{MemoryRecord, MemoryStore};

    fn fixture() -> (Arc<InMemoryRegistry>, MemoryStore) {
        let registry = Arc::new(
            InMemoryRegistry::from_definitions([
                SchemaDefinition::new("Lit").field("_Color", FieldType::Color),
                SchemaDefinition::new("Unlit").field("_Color", FieldType::Color),
                SchemaDefinition::new("Toon").field("_Color", FieldType::Color),
            ])
            .unwrap(),
        );
        let store = MemoryStore::with_records(
            registry.clone(),
            [
                MemoryRecord::new("a", "Lit"),
                MemoryRecord::new("b", "Toon"),
                MemoryRecord::new("c", "Lit"),
            ],
        )
        .unwrap();
        (registry, store)
    }

    #[test]
    fn test_selection_dedupes_in_order() {
        let (registry, store) = fixture();
        let introspector = SchemaIntrospector::new(&*registry);
        let session = ConversionSession::from_selection(
            &introspector,
            &store,
            &["Toon".into()],
            &["a".into(), "b".into(), "c".into()],
            ConversionExecutor::default(),
        )
        .unwrap();

        let sources: Vec<_> = session.mappings().iter().map(|m| m.source_schema().as_str()).collect();
        assert_eq!(sources, ["Toon", "Lit"]);
    }

    #[test]
    fn test_convert_replaces_mapping() {
        let (registry, mut store) = fixture();
        let introspector = SchemaIntrospector::new(&*registry);
        let mut session =
            ConversionSession::open(&introspector, ["Lit".into()], ConversionExecutor::default())
                .unwrap();

        let lit = SchemaId::from("Lit");
        assert_eq!(session.affected_records(&lit, &store).unwrap().len(), 2);
        session
            .mapping_mut(&lit)
            .unwrap()
            .assign_target(&introspector, "Unlit".into())
            .unwrap();

        let report = session.convert(&lit, &introspector, &mut store).unwrap();
        assert_eq!(report.converted.len(), 2);

        assert!(session.mapping(&lit).is_err());
        let next = session.mapping(&"Unlit".into()).unwrap();
        assert_eq!(next.state(), MappingState::NoTarget);
        assert_eq!(next.mapped_count(), 0);
    }

    #[test]
    fn test_convert_into_open_schema_keeps_one_mapping() {
        let (registry, mut store) = fixture();
        let introspector = SchemaIntrospector::new(&*registry);
        let mut session = ConversionSession::open(
            &introspector,
            ["Unlit".into(), "Lit".into()],
            ConversionExecutor::default(),
        )
        .unwrap();

        let unlit = SchemaId::from("Unlit");
        let lit = SchemaId::from("Lit");
        session
            .mapping_mut(&unlit)
            .unwrap()
            .assign_target(&introspector, "Toon".into())
            .unwrap();
        session
            .mapping_mut(&lit)
            .unwrap()
            .assign_target(&introspector, "Unlit".into())
            .unwrap();

        let report = session.convert(&lit, &introspector, &mut store).unwrap();
        assert!(report.is_clean());

        let sources: Vec<_> = session.mappings().iter().map(|m| m.source_schema().as_str()).collect();
        assert_eq!(sources, ["Unlit"]);
        assert!(session.mapping(&lit).is_err());

        // The existing mapping and its target survive
        let existing = session.mapping(&unlit).unwrap();
        assert_eq!(existing.state(), MappingState::TargetAssigned);
        assert_eq!(existing.target_schema(), Some(&SchemaId::from("Toon")));
        assert_eq!(session.affected_records(&unlit, &store).unwrap().len(), 2);
    }

    #[test]
    fn test_convert_without_target_is_rejected() {
        let (registry, mut store) = fixture();
        let introspector = SchemaIntrospector::new(&*registry);
        let mut session =
            ConversionSession::open(&introspector, ["Lit".into()], ConversionExecutor::default())
                .unwrap();

        let result = session.convert(&"Lit".into(), &introspector, &mut store);
        assert!(matches!(result, Err(RemapError::NoTarget(_))));
        assert_eq!(store.find_by_bound_schema(&"Lit".into()).len(), 2);
    }
}
