use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// One member of a categorical domain: position in the declared domain plus
/// its canonical symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ordinal: usize,
    pub name: String,
}

impl EnumValue {
    pub fn new(ordinal: usize, name: impl Into<String>) -> Self {
        Self { ordinal, name: name.into() }
    }
}

/// Typed value of one field.
///
/// "No value" is never a variant; it is `Option::None` at every API
/// boundary, so an absent cell can't be confused with an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    String(String),
    Int32(i32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Enum(EnumValue),
}

impl Value {
    /// Short variant name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Enum(_) => "enum",
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Enum(v) => f.write_str(&v.name),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int32(v) => serde_json::Value::from(*v),
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::UInt64(v) => serde_json::Value::from(*v),
            // Non-finite floats have no JSON number form.
            Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(v.to_string())),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(v.to_string())),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

/// Positional record of optional values. Order matches the schema's fields.
///
/// The built-in record type for schemas that are not bound to a Rust struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<Option<Value>>);

impl Row {
    pub fn with_len(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Store `value` at `index`, growing the row with empty slots if needed.
    pub fn set(&mut self, index: usize, value: Option<Value>) {
        if self.0.len() <= index {
            self.0.resize(index + 1, None);
        }
        self.0[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_set_grows_with_empty_slots() {
        let mut row = Row::default();
        row.set(2, Some(Value::Int32(7)));
        assert_eq!(row.0.len(), 3);
        assert_eq!(row.get(0), None);
        assert_eq!(row.get(2), Some(&Value::Int32(7)));
    }

    #[test]
    fn json_form_of_values() {
        assert_eq!(serde_json::Value::from(&Value::Int64(-3)), serde_json::json!(-3));
        assert_eq!(serde_json::Value::from(&Value::Bool(true)), serde_json::json!(true));
        assert_eq!(
            serde_json::Value::from(&Value::Enum(EnumValue::new(1, "green"))),
            serde_json::json!("green")
        );
        assert_eq!(
            serde_json::Value::from(&Value::Float64(f64::NAN)),
            serde_json::json!("NaN")
        );
    }
}
