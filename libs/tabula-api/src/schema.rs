use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::converter::ConverterFactory;
use crate::error::ConfigError;
use crate::flags::ConverterFlags;
use crate::value::EnumValue;

// ════════════════════════════════════════════════════════════════
//  Enum Domain
// ════════════════════════════════════════════════════════════════

/// Closed, ordered set of symbolic names of a categorical type.
///
/// Non-empty and free of duplicates; the position of a name is the
/// ordinal of the corresponding `EnumValue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDomain {
    names: Vec<String>,
}

impl EnumDomain {
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigError::schema("enum domain must have at least one value"));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.is_empty() {
                return Err(ConfigError::schema("enum domain contains an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::schema(format!(
                    "enum domain contains '{name}' more than once"
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All members of the domain, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = EnumValue> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| EnumValue::new(ordinal, name.as_str()))
    }

    pub fn value_of(&self, name: &str) -> Option<EnumValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|ordinal| EnumValue::new(ordinal, name))
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Type
// ════════════════════════════════════════════════════════════════

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Char,
    String,
    Int32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// Calendar date without time zone.
    Date,
    /// Date and time without time zone.
    DateTime,
    /// Categorical type with an enumerable domain.
    Enum(EnumDomain),
}

impl FieldType {
    pub fn tag(&self) -> TypeTag {
        match self {
            FieldType::Bool => TypeTag::Bool,
            FieldType::Char => TypeTag::Char,
            FieldType::String => TypeTag::String,
            FieldType::Int32 => TypeTag::Int32,
            FieldType::Int64 => TypeTag::Int64,
            FieldType::UInt64 => TypeTag::UInt64,
            FieldType::Float32 => TypeTag::Float32,
            FieldType::Float64 => TypeTag::Float64,
            FieldType::Date => TypeTag::Date,
            FieldType::DateTime => TypeTag::DateTime,
            FieldType::Enum(_) => TypeTag::Enum,
        }
    }

    /// The enumerable domain, if this is a categorical type.
    pub fn enum_domain(&self) -> Option<&EnumDomain> {
        match self {
            FieldType::Enum(domain) => Some(domain),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Enum(domain) => write!(f, "enum({})", domain.names().join("|")),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Discriminant of `FieldType`: the key under which default converters
/// are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Bool,
    Char,
    String,
    Int32,
    Int64,
    #[serde(rename = "uint64")]
    UInt64,
    Float32,
    Float64,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Enum,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Char => write!(f, "char"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Int32 => write!(f, "int32"),
            TypeTag::Int64 => write!(f, "int64"),
            TypeTag::UInt64 => write!(f, "uint64"),
            TypeTag::Float32 => write!(f, "float32"),
            TypeTag::Float64 => write!(f, "float64"),
            TypeTag::Date => write!(f, "date"),
            TypeTag::DateTime => write!(f, "datetime"),
            TypeTag::Enum => write!(f, "enum"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field Descriptor
// ════════════════════════════════════════════════════════════════

/// Explicit converter choice for a field, overriding the registry default.
#[derive(Debug, Clone)]
pub enum ConverterRef {
    /// Converter registered under an explicit key.
    Named(String),
    /// Stand-alone constructor; must not depend on external state.
    Factory(ConverterFactory),
}

/// Everything the field-discovery collaborator knows about one field.
///
/// `format` and `default_value` use `None` as the "unset" marker, so no
/// user-supplied text (including `""`) can be mistaken for it.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    /// Name used in headers and diagnostics. Defaults to `name`.
    pub cell_name: Option<String>,
    pub field_type: FieldType,
    /// The cell may not be empty.
    pub required: bool,
    /// Trim surrounding whitespace from the cell before conversion.
    pub trim_input: bool,
    pub format: Option<String>,
    pub flags: ConverterFlags,
    pub converter: Option<ConverterRef>,
    /// Raw text used when the cell is empty.
    pub default_value: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            cell_name: None,
            field_type,
            required: false,
            trim_input: false,
            format: None,
            flags: ConverterFlags::NONE,
            converter: None,
            default_value: None,
        }
    }

    pub fn cell_name(&self) -> &str {
        self.cell_name.as_deref().unwrap_or(&self.name)
    }

    pub fn with_cell_name(mut self, cell_name: impl Into<String>) -> Self {
        self.cell_name = Some(cell_name.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn trim_input(mut self) -> Self {
        self.trim_input = true;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_flags(mut self, flags: ConverterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_converter(mut self, converter: ConverterRef) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}
