//! Property values and declared property types.

use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Type name reported for properties without a declaration.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Value of a widget property as surfaced to the editor.
///
/// Live attribute overlays always produce [`PropertyValue::String`]; the
/// other variants come from registry defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    Mixed,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Mixed => "mixed",
        }
    }
}

/// Type declaration for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyType {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(rename = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<PropertyValue>>,
}

impl PropertyType {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            default_value: None,
            min: None,
            max: None,
            values: None,
        }
    }

    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    pub fn number() -> Self {
        Self::new(PropertyKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    /// A `mixed` property restricted to `values`.
    pub fn mixed(values: Vec<PropertyValue>) -> Self {
        Self {
            values: Some(values),
            ..Self::new(PropertyKind::Mixed)
        }
    }

    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.as_str()
    }
}
