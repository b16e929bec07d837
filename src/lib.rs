//! Schema Remap
//!
//! Moves records from one typed schema to another: discover both schemas'
//! fields, map source fields onto target fields of the same value kind, and
//! transfer values while rebinding each record.
//!
//! ## Features
//!
//! - **Introspection**: Ordered, typed field lists from any [`SchemaRegistry`]
//! - **Auto-Matching**: Fields pair up by name and value kind on every retarget
//! - **Overrides**: Manual edits, validated against the target's fields
//! - **Two-Phase Transfer**: Read under the old schema, rebind, write under the new one
//! - **Reports**: Per-record failures collected without stopping the batch
//!
//! ## Flow
//!
//! ```text
//! SchemaRegistry ──describe──▶ SchemaMapping ──pairs──▶ ConversionExecutor
//!                              (source snapshot,        (read ▶ rebind ▶ write
//!                               target by kind,          per record in a
//!                               field mapping)           RecordStore)
//! ```

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod convert;
pub mod error;
pub mod introspect;
pub mod mapping;
pub mod registry;
pub mod schema;
pub mod session;
pub mod store;
pub mod value;

pub use catalog::Catalog;
pub use checksum::Fingerprint;
pub use config::RemapConfig;
pub use convert::{
    CapturedValue, ConversionExecutor, ConversionPhase, ConversionReport, FailurePolicy,
    RecordFailure,
};
pub use error::{RemapError, Result};
pub use introspect::SchemaIntrospector;
pub use mapping::{MappingEntry, MappingState, SchemaMapping};
pub use registry::{InMemoryRegistry, SchemaRegistry};
pub use schema::{FieldDeclaration, FieldDescriptor, FieldType, SchemaDefinition, SchemaId, ValueKind};
pub use session::ConversionSession;
pub use store::{MemoryRecord, MemoryStore, RecordId, RecordStore};
pub use value::{Color, FieldValue, TextureRef};
