//! Schema types and structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::FieldValue;

/// Identifier of a schema in the registry (e.g., "Standard", "Unlit/Color")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchemaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SchemaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of value a schema field declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// RGBA color
    Color,
    /// Plain scalar
    #[serde(alias = "float")]
    Scalar,
    /// Scalar with bounds
    Range,
    /// Reference to a texture asset
    #[serde(alias = "tex_env")]
    Texture,
    /// Four-component vector
    Vector,
}

/// The concrete value carried by a field, independent of declaration details.
///
/// `Scalar` and `Range` fields share [`ValueKind::Scalar`]; target fields are
/// grouped and matched by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Color,
    Scalar,
    Texture,
    Vector,
}

impl FieldType {
    /// Get the value kind this field type reads and writes
    pub fn value_kind(&self) -> ValueKind {
        match self {
            FieldType::Color => ValueKind::Color,
            FieldType::Scalar | FieldType::Range => ValueKind::Scalar,
            FieldType::Texture => ValueKind::Texture,
            FieldType::Vector => ValueKind::Vector,
        }
    }

    /// Whether values of this type can be transferred into a field of `other`
    pub fn is_compatible_with(&self, other: FieldType) -> bool {
        self.value_kind() == other.value_kind()
    }

    /// Lowercase name used in listings and fingerprints
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Color => "color",
            FieldType::Scalar => "scalar",
            FieldType::Range => "range",
            FieldType::Texture => "texture",
            FieldType::Vector => "vector",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Color => "color",
            ValueKind::Scalar => "scalar",
            ValueKind::Texture => "texture",
            ValueKind::Vector => "vector",
        };
        f.write_str(name)
    }
}

/// A (name, type) pair identifying one schema field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        self.field_type.value_kind()
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.field_type)
    }
}

/// A field as declared by a schema, including its default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Value a record reads before anything was written to this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor::new(self.name.clone(), self.field_type)
    }

    /// The declared default, falling back to the type's zero value
    pub fn default_value(&self) -> FieldValue {
        self.default
            .clone()
            .filter(|v| v.kind() == self.field_type.value_kind())
            .unwrap_or_else(|| FieldValue::default_for(self.field_type))
    }
}

/// A named, ordered set of field declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub id: SchemaId,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

impl SchemaDefinition {
    pub fn new(id: impl Into<SchemaId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field declaration
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDeclaration::new(name, field_type));
        self
    }

    /// Append a field declaration with an explicit default
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        default: FieldValue,
    ) -> Self {
        self.fields
            .push(FieldDeclaration::new(name, field_type).with_default(default));
        self
    }

    /// Get a declaration by field name
    pub fn get_field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields.iter().map(FieldDeclaration::descriptor).collect()
    }
}
