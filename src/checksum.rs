//! Fingerprints for detecting schema drift between snapshots

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::FieldDescriptor;

/// SHA256 fingerprint of a schema's ordered field list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute fingerprint from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute fingerprint from descriptors in declaration order
    pub fn of_fields(fields: &[FieldDescriptor]) -> Self {
        // One `name:type` line per field; order is significant
        let canonical: String = fields
            .iter()
            .map(|f| format!("{}:{}\n", f.name, f.field_type))
            .collect();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log output
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    /// Verify that a field list matches this fingerprint
    pub fn verify(&self, fields: &[FieldDescriptor]) -> bool {
        *self == Self::of_fields(fields)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
