//! Field values carried by records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{FieldType, ValueKind};

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Reference to a texture asset by its store identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureRef(String);

impl TextureRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete field value, one variant per [`ValueKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Color(Color),
    Scalar(f32),
    /// `None` is an unassigned texture slot
    Texture(Option<TextureRef>),
    Vector([f32; 4]),
}

impl FieldValue {
    /// The zero value a freshly declared field of `field_type` holds
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type.value_kind() {
            ValueKind::Color => FieldValue::Color(Color::WHITE),
            ValueKind::Scalar => FieldValue::Scalar(0.0),
            ValueKind::Texture => FieldValue::Texture(None),
            ValueKind::Vector => FieldValue::Vector([0.0; 4]),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Color(_) => ValueKind::Color,
            FieldValue::Scalar(_) => ValueKind::Scalar,
            FieldValue::Texture(_) => ValueKind::Texture,
            FieldValue::Vector(_) => ValueKind::Vector,
        }
    }

    /// Whether this value can be stored in a field declared as `field_type`
    pub fn fits(&self, field_type: FieldType) -> bool {
        self.kind() == field_type.value_kind()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            FieldValue::Scalar(v) => write!(f, "{}", v),
            FieldValue::Texture(Some(t)) => write!(f, "texture({})", t),
            FieldValue::Texture(None) => f.write_str("texture(none)"),
            FieldValue::Vector([x, y, z, w]) => write!(f, "({}, {}, {}, {})", x, y, z, w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_kind() {
        for t in [
            FieldType::Color,
            FieldType::Scalar,
            FieldType::Range,
            FieldType::Texture,
            FieldType::Vector,
        ] {
            assert!(FieldValue::default_for(t).fits(t));
        }
    }

    #[test]
    fn test_scalar_fits_range() {
        assert!(FieldValue::Scalar(0.5).fits(FieldType::Range));
        assert!(!FieldValue::Scalar(0.5).fits(FieldType::Color));
    }

    #[test]
    fn test_value_json_shape() {
        let v = FieldValue::Texture(Some(TextureRef::new("T1")));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({ "texture": "T1" }));
    }
}
