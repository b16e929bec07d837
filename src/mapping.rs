//! Field mapping between a source schema and a target schema
//!
//! A [`SchemaMapping`] snapshots the source schema's fields once, then maps
//! them onto the fields of a target schema. Assigning a target rebuilds the
//! whole mapping by auto-matching on name and value kind; manual overrides
//! only live until the next retarget.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::checksum::Fingerprint;
use crate::error::{RemapError, Result};
use crate::introspect::SchemaIntrospector;
use crate::schema::{FieldDescriptor, SchemaId, ValueKind};

/// Lifecycle of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingState {
    NoTarget,
    TargetAssigned,
}

/// Target schema fields grouped by value kind
#[derive(Debug, Clone)]
struct TargetSchema {
    id: SchemaId,
    fields_by_kind: BTreeMap<ValueKind, Vec<FieldDescriptor>>,
}

impl TargetSchema {
    fn group(id: SchemaId, fields: Vec<FieldDescriptor>) -> Self {
        let mut fields_by_kind: BTreeMap<ValueKind, Vec<FieldDescriptor>> = BTreeMap::new();
        for field in fields {
            fields_by_kind.entry(field.value_kind()).or_default().push(field);
        }
        Self { id, fields_by_kind }
    }

    fn candidates(&self, kind: ValueKind) -> Option<&[FieldDescriptor]> {
        self.fields_by_kind.get(&kind).map(Vec::as_slice)
    }

    /// Same name and type first, then same name within the kind group.
    ///
    /// `Range` and `Scalar` share a kind, so a same-name field can pair
    /// across those two types even though their `FieldType`s differ.
    fn auto_match(&self, field: &FieldDescriptor) -> Option<&FieldDescriptor> {
        let candidates = self.candidates(field.value_kind())?;
        candidates
            .iter()
            .find(|c| c == &field)
            .or_else(|| candidates.iter().find(|c| c.name == field.name))
    }
}

/// One row of a mapping, for display and reports
#[derive(Debug, Clone, Serialize)]
pub struct MappingEntry {
    pub source: FieldDescriptor,
    pub target: Option<FieldDescriptor>,
    /// Number of type-compatible target fields
    pub candidates: usize,
}

/// Mapping state for one source schema
#[derive(Debug, Clone)]
pub struct SchemaMapping {
    source_schema: SchemaId,
    source_fields: Vec<FieldDescriptor>,
    source_fingerprint: Fingerprint,
    target: Option<TargetSchema>,
    /// Keyed by position in `source_fields`
    field_mapping: BTreeMap<usize, FieldDescriptor>,
}

impl SchemaMapping {
    /// Snapshot the source schema's fields; starts without a target
    pub fn new(introspector: &SchemaIntrospector<'_>, source_schema: SchemaId) -> Result<Self> {
        let source_fields = introspector.describe(&source_schema)?;
        let source_fingerprint = Fingerprint::of_fields(&source_fields);
        debug!(
            source = %source_schema,
            fields = source_fields.len(),
            fingerprint = source_fingerprint.short(),
            "opened schema mapping"
        );
        Ok(Self {
            source_schema,
            source_fields,
            source_fingerprint,
            target: None,
            field_mapping: BTreeMap::new(),
        })
    }

    /// Assign a target schema and rebuild the mapping from scratch.
    ///
    /// Every prior entry, manual overrides included, is discarded. If the
    /// target cannot be described the mapping is left unchanged.
    pub fn assign_target(
        &mut self,
        introspector: &SchemaIntrospector<'_>,
        target_schema: SchemaId,
    ) -> Result<()> {
        let target_fields = introspector.describe(&target_schema)?;
        let target = TargetSchema::group(target_schema, target_fields);

        self.field_mapping.clear();
        for (i, field) in self.source_fields.iter().enumerate() {
            if let Some(matched) = target.auto_match(field) {
                debug!(source = %field, target = %matched, "auto-matched field");
                self.field_mapping.insert(i, matched.clone());
            }
        }

        info!(
            source = %self.source_schema,
            target = %target.id,
            mapped = self.field_mapping.len(),
            unmapped = self.source_fields.len() - self.field_mapping.len(),
            "assigned target schema"
        );
        self.target = Some(target);
        Ok(())
    }

    /// Manually map `source_field` to `target_field`, or unmap it with `None`.
    ///
    /// Unmapping is idempotent. A concrete target must be one of the current
    /// target fields of the same value kind; otherwise the edit is rejected
    /// and the mapping is unchanged.
    pub fn set_override(
        &mut self,
        source_field: &FieldDescriptor,
        target_field: Option<&FieldDescriptor>,
    ) -> Result<()> {
        let index = self.source_index(source_field).ok_or_else(|| {
            RemapError::invalid_edit(
                source_field,
                format!("not a field of source schema {}", self.source_schema),
            )
        })?;

        let Some(target_field) = target_field else {
            if self.field_mapping.remove(&index).is_some() {
                debug!(source = %source_field, "cleared field mapping");
            }
            return Ok(());
        };

        let target = self
            .target
            .as_ref()
            .ok_or_else(|| RemapError::invalid_edit(source_field, "no target schema assigned"))?;

        if !source_field.field_type.is_compatible_with(target_field.field_type) {
            return Err(RemapError::invalid_edit(
                source_field,
                format!("type mismatch with {}", target_field),
            ));
        }

        let known = target
            .candidates(source_field.value_kind())
            .is_some_and(|c| c.contains(target_field));
        if !known {
            return Err(RemapError::invalid_edit(
                source_field,
                format!("{} is not a field of target schema {}", target_field, target.id),
            ));
        }

        debug!(source = %source_field, target = %target_field, "overrode field mapping");
        self.field_mapping.insert(index, target_field.clone());
        Ok(())
    }

    fn source_index(&self, field: &FieldDescriptor) -> Option<usize> {
        self.source_fields.iter().position(|f| f == field)
    }

    pub fn source_schema(&self) -> &SchemaId {
        &self.source_schema
    }

    /// Source fields as they were when the mapping was opened
    pub fn source_fields(&self) -> &[FieldDescriptor] {
        &self.source_fields
    }

    pub fn source_fingerprint(&self) -> &Fingerprint {
        &self.source_fingerprint
    }

    /// Whether the source schema still declares the snapshotted fields
    pub fn source_is_current(&self, introspector: &SchemaIntrospector<'_>) -> Result<bool> {
        let fields = introspector.describe(&self.source_schema)?;
        Ok(self.source_fingerprint.verify(&fields))
    }

    pub fn target_schema(&self) -> Option<&SchemaId> {
        self.target.as_ref().map(|t| &t.id)
    }

    pub fn state(&self) -> MappingState {
        match self.target {
            Some(_) => MappingState::TargetAssigned,
            None => MappingState::NoTarget,
        }
    }

    /// Target fields a source field of `kind` may be mapped to
    pub fn target_fields_of(&self, kind: ValueKind) -> &[FieldDescriptor] {
        self.target
            .as_ref()
            .and_then(|t| t.candidates(kind))
            .unwrap_or_default()
    }

    /// Type-compatible target fields for `source_field`
    pub fn candidates(&self, source_field: &FieldDescriptor) -> &[FieldDescriptor] {
        self.target_fields_of(source_field.value_kind())
    }

    /// Source fields whose kind has no target field at all
    pub fn fields_without_candidates(&self) -> Vec<&FieldDescriptor> {
        let Some(target) = &self.target else {
            return Vec::new();
        };
        self.source_fields
            .iter()
            .filter(|f| !target.fields_by_kind.contains_key(&f.value_kind()))
            .collect()
    }

    /// The target field `source_field` is mapped to, if any
    pub fn mapped(&self, source_field: &FieldDescriptor) -> Option<&FieldDescriptor> {
        self.source_index(source_field)
            .and_then(|i| self.field_mapping.get(&i))
    }

    /// Source fields that will be skipped by a conversion
    pub fn unmapped_fields(&self) -> Vec<&FieldDescriptor> {
        self.source_fields
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.field_mapping.contains_key(i))
            .map(|(_, f)| f)
            .collect()
    }

    /// Mapped (source, target) pairs in source declaration order
    pub fn pairs(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldDescriptor)> + '_ {
        self.field_mapping
            .iter()
            .map(|(&i, target)| (&self.source_fields[i], target))
    }

    pub fn mapped_count(&self) -> usize {
        self.field_mapping.len()
    }

    /// Every source field with its mapping and candidate count
    pub fn entries(&self) -> Vec<MappingEntry> {
        self.source_fields
            .iter()
            .enumerate()
            .map(|(i, f)| MappingEntry {
                source: f.clone(),
                target: self.field_mapping.get(&i).cloned(),
                candidates: self.candidates(f).len(),
            })
            .collect()
    }

    /// Target equals source; converting would be meaningless
    pub fn is_identity(&self) -> bool {
        self.target_schema() == Some(&self.source_schema)
    }

    /// Check that a conversion may run, returning the target schema
    pub fn conversion_target(&self) -> Result<&SchemaId> {
        let target = self
            .target_schema()
            .ok_or_else(|| RemapError::NoTarget(self.source_schema.clone()))?;
        if target == &self.source_schema {
            return Err(RemapError::ConversionSkipped {
                source_schema: self.source_schema.clone(),
                reason: "target schema is the source schema".to_string(),
            });
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::schema::{FieldType, SchemaDefinition};

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::from_definitions([
            SchemaDefinition::new("Lit")
                .field("_Color", FieldType::Color)
                .field("_MainTex", FieldType::Texture),
            SchemaDefinition::new("Unlit")
                .field("_Color", FieldType::Color)
                .field("_Cutoff", FieldType::Scalar),
            SchemaDefinition::new("Tinted")
                .field("_Tint", FieldType::Color)
                .field("_BaseColor", FieldType::Color)
                .field("_BaseMap", FieldType::Texture),
            SchemaDefinition::new("Glossy")
                .field("_Glossiness", FieldType::Range),
            SchemaDefinition::new("Smooth")
                .field("_Glossiness", FieldType::Scalar),
        ])
        .unwrap()
    }

    fn color() -> FieldDescriptor {
        FieldDescriptor::new("_Color", FieldType::Color)
    }

    fn main_tex() -> FieldDescriptor {
        FieldDescriptor::new("_MainTex", FieldType::Texture)
    }

    #[test]
    fn test_new_mapping_has_no_target() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();

        assert_eq!(mapping.state(), MappingState::NoTarget);
        assert_eq!(mapping.source_fields(), &[color(), main_tex()]);
        assert_eq!(mapping.mapped_count(), 0);
        assert!(mapping.fields_without_candidates().is_empty());
        assert!(matches!(mapping.conversion_target(), Err(RemapError::NoTarget(_))));
    }

    #[test]
    fn test_auto_match_by_name_and_type() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Unlit".into()).unwrap();

        assert_eq!(mapping.state(), MappingState::TargetAssigned);
        assert_eq!(mapping.mapped(&color()), Some(&color()));
        assert_eq!(mapping.mapped(&main_tex()), None);
        assert_eq!(mapping.fields_without_candidates(), vec![&main_tex()]);
        assert_eq!(mapping.unmapped_fields(), vec![&main_tex()]);
    }

    #[test]
    fn test_no_name_match_leaves_field_unmapped() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Tinted".into()).unwrap();

        assert_eq!(mapping.mapped_count(), 0);
        assert_eq!(mapping.candidates(&color()).len(), 2);
        assert_eq!(mapping.candidates(&main_tex()).len(), 1);
        assert!(mapping.fields_without_candidates().is_empty());
    }

    #[test]
    fn test_range_matches_scalar_of_same_name() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Glossy".into()).unwrap();
        mapping.assign_target(&introspector, "Smooth".into()).unwrap();

        let source = FieldDescriptor::new("_Glossiness", FieldType::Range);
        assert_eq!(
            mapping.mapped(&source),
            Some(&FieldDescriptor::new("_Glossiness", FieldType::Scalar))
        );
    }

    #[test]
    fn test_override_and_clear() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Tinted".into()).unwrap();

        let tint = FieldDescriptor::new("_Tint", FieldType::Color);
        mapping.set_override(&color(), Some(&tint)).unwrap();
        assert_eq!(mapping.mapped(&color()), Some(&tint));

        mapping.set_override(&color(), None).unwrap();
        assert_eq!(mapping.mapped(&color()), None);
        // Second clear is a no-op
        mapping.set_override(&color(), None).unwrap();
        assert_eq!(mapping.mapped(&color()), None);
    }

    #[test]
    fn test_override_rejects_wrong_type() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Tinted".into()).unwrap();

        let base_map = FieldDescriptor::new("_BaseMap", FieldType::Texture);
        let result = mapping.set_override(&color(), Some(&base_map));
        assert!(matches!(result, Err(RemapError::InvalidMappingEdit { .. })));
        assert_eq!(mapping.mapped(&color()), None);
    }

    #[test]
    fn test_override_rejects_unknown_target_field() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Unlit".into()).unwrap();

        let stranger = FieldDescriptor::new("_Tint", FieldType::Color);
        let result = mapping.set_override(&color(), Some(&stranger));
        assert!(matches!(result, Err(RemapError::InvalidMappingEdit { .. })));
        assert_eq!(mapping.mapped(&color()), Some(&color()));
    }

    #[test]
    fn test_override_rejects_unknown_source_field() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Unlit".into()).unwrap();

        let stranger = FieldDescriptor::new("_Color", FieldType::Vector);
        assert!(mapping.set_override(&stranger, None).is_err());
    }

    #[test]
    fn test_override_without_target() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();

        assert!(mapping.set_override(&color(), None).is_ok());
        assert!(mapping.set_override(&color(), Some(&color())).is_err());
    }

    #[test]
    fn test_retarget_discards_overrides() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Tinted".into()).unwrap();
        mapping
            .set_override(&color(), Some(&FieldDescriptor::new("_Tint", FieldType::Color)))
            .unwrap();
        mapping
            .set_override(&main_tex(), Some(&FieldDescriptor::new("_BaseMap", FieldType::Texture)))
            .unwrap();

        mapping.assign_target(&introspector, "Tinted".into()).unwrap();
        assert_eq!(mapping.mapped_count(), 0);

        mapping.assign_target(&introspector, "Unlit".into()).unwrap();
        let pairs: Vec<_> = mapping.pairs().collect();
        assert_eq!(pairs, vec![(&color(), &color())]);
    }

    #[test]
    fn test_failed_retarget_keeps_state() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Unlit".into()).unwrap();

        assert!(mapping.assign_target(&introspector, "Missing".into()).is_err());
        assert_eq!(mapping.target_schema(), Some(&SchemaId::from("Unlit")));
        assert_eq!(mapping.mapped_count(), 1);
    }

    #[test]
    fn test_self_target_is_not_convertible() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mut mapping = SchemaMapping::new(&introspector, "Lit".into()).unwrap();
        mapping.assign_target(&introspector, "Lit".into()).unwrap();

        assert!(mapping.is_identity());
        assert_eq!(mapping.mapped_count(), 2);
        assert!(matches!(
            mapping.conversion_target(),
            Err(RemapError::ConversionSkipped { .. })
        ));
    }

    #[test]
    fn test_source_snapshot_staleness() {
        let mut registry = registry();
        let mapping = {
            let introspector = SchemaIntrospector::new(&registry);
            SchemaMapping::new(&introspector, "Lit".into()).unwrap()
        };
        assert!(mapping
            .source_is_current(&SchemaIntrospector::new(&registry))
            .unwrap());

        // A registry where "Lit" declares different fields
        registry = InMemoryRegistry::from_definitions([
            SchemaDefinition::new("Lit").field("_Color", FieldType::Vector)
        ])
        .unwrap();
        assert!(!mapping
            .source_is_current(&SchemaIntrospector::new(&registry))
            .unwrap());
    }
}
