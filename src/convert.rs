//! Record conversion
//!
//! Each record goes through three steps with no interleaving:
//!
//! 1. read every mapped source field under the source schema
//! 2. rebind the record to the target schema
//! 3. write the captured values under the target schema
//!
//! Field accessors are only valid for the schema a record is bound to, so all
//! reads must finish before the rebind and all writes must start after it.
//! There is no rollback: a record that fails after the rebind stays rebound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RemapError, Result};
use crate::mapping::SchemaMapping;
use crate::schema::{FieldDescriptor, SchemaId};
use crate::store::{RecordId, RecordStore};
use crate::value::FieldValue;

/// What to do with the rest of a batch once a record fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next record
    #[default]
    Continue,
    /// Stop at the first failed record
    Abort,
}

/// Step of a record conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPhase {
    Read,
    Rebind,
    Write,
}

/// A value read from the source side, addressed to a target field
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedValue {
    pub target: FieldDescriptor,
    pub value: FieldValue,
}

/// A record that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub record: RecordId,
    pub phase: ConversionPhase,
    pub error: String,
}

/// Outcome of converting a batch
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source_schema: SchemaId,
    pub target_schema: SchemaId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records rebound with every mapped value written
    pub converted: Vec<RecordId>,
    pub failures: Vec<RecordFailure>,
    /// Records never attempted because the batch was aborted
    pub not_attempted: Vec<RecordId>,
    pub aborted: bool,
}

impl ConversionReport {
    fn begin(source_schema: SchemaId, target_schema: SchemaId) -> Self {
        let now = Utc::now();
        Self {
            source_schema,
            target_schema,
            started_at: now,
            finished_at: now,
            converted: Vec::new(),
            failures: Vec::new(),
            not_attempted: Vec::new(),
            aborted: false,
        }
    }

    /// Every record was converted
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.not_attempted.is_empty()
    }

    /// Total records handed to the batch
    pub fn total(&self) -> usize {
        self.converted.len() + self.failures.len() + self.not_attempted.len()
    }
}

/// Applies a [`SchemaMapping`] to records in a [`RecordStore`]
#[derive(Debug, Clone, Default)]
pub struct ConversionExecutor {
    policy: FailurePolicy,
}

impl ConversionExecutor {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Convert every record currently bound to the mapping's source schema.
    ///
    /// The store is queried once; the same record list is used for the whole batch.
    pub fn convert_bound<S: RecordStore + ?Sized>(
        &self,
        mapping: &SchemaMapping,
        store: &mut S,
    ) -> Result<ConversionReport> {
        mapping.conversion_target()?;
        let records = store.find_by_bound_schema(mapping.source_schema());
        self.convert(mapping, store, &records)
    }

    /// Convert `records` from the mapping's source schema to its target.
    ///
    /// Fails without touching any record if the mapping has no target or
    /// targets its own source. Per-record failures are collected in the report.
    pub fn convert<S: RecordStore + ?Sized>(
        &self,
        mapping: &SchemaMapping,
        store: &mut S,
        records: &[RecordId],
    ) -> Result<ConversionReport> {
        let target = mapping.conversion_target()?.clone();
        let mut report = ConversionReport::begin(mapping.source_schema().clone(), target.clone());

        info!(
            source = %mapping.source_schema(),
            target = %target,
            records = records.len(),
            fields = mapping.mapped_count(),
            "converting records"
        );

        for (i, record) in records.iter().enumerate() {
            match self.convert_record(mapping, &target, store, record) {
                Ok(()) => report.converted.push(record.clone()),
                Err(failure) => {
                    warn!(
                        record = %failure.record,
                        phase = ?failure.phase,
                        error = %failure.error,
                        "record conversion failed"
                    );
                    report.failures.push(failure);
                    if self.policy == FailurePolicy::Abort {
                        report.aborted = true;
                        report.not_attempted = records[i + 1..].to_vec();
                        break;
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            converted = report.converted.len(),
            failed = report.failures.len(),
            aborted = report.aborted,
            "conversion finished"
        );
        Ok(report)
    }

    fn convert_record<S: RecordStore + ?Sized>(
        &self,
        mapping: &SchemaMapping,
        target: &SchemaId,
        store: &mut S,
        record: &RecordId,
    ) -> std::result::Result<(), RecordFailure> {
        let fail = |phase: ConversionPhase, error: RemapError| RecordFailure {
            record: record.clone(),
            phase,
            error: error.to_string(),
        };

        let captured =
            read_phase(mapping, &*store, record).map_err(|e| fail(ConversionPhase::Read, e))?;
        store
            .rebind(record, target)
            .map_err(|e| fail(ConversionPhase::Rebind, e))?;
        write_phase(store, record, &captured).map_err(|e| fail(ConversionPhase::Write, e))?;
        Ok(())
    }
}

/// Read every mapped source field of `record`, in source declaration order.
///
/// The record must still be bound to the mapping's source schema.
pub fn read_phase<S: RecordStore + ?Sized>(
    mapping: &SchemaMapping,
    store: &S,
    record: &RecordId,
) -> Result<Vec<CapturedValue>> {
    let bound = store.bound_schema(record)?;
    if &bound != mapping.source_schema() {
        return Err(RemapError::field_access(
            record.clone(),
            "",
            format!("bound to {}, expected {}", bound, mapping.source_schema()),
        ));
    }

    mapping
        .pairs()
        .map(|(source, target)| -> Result<CapturedValue> {
            let value = store.read_field(record, &source.name, source.field_type)?;
            debug!(record = %record, source = %source, target = %target, "captured value");
            Ok(CapturedValue {
                target: target.clone(),
                value,
            })
        })
        .collect()
}

/// Write captured values into `record` under its current schema
pub fn write_phase<S: RecordStore + ?Sized>(
    store: &mut S,
    record: &RecordId,
    captured: &[CapturedValue],
) -> Result<()> {
    for CapturedValue { target, value } in captured {
        store.write_field(record, &target.name, target.field_type, value.clone())?;
    }
    Ok(())
}
