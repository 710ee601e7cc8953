use std::path::Path;

use serde::Deserialize;
use tabula_api::{ConverterFlags, ConverterRef, EnumDomain, FieldDescriptor, FieldType, Row, TypeTag};

use crate::error::SchemaError;
use crate::registry::ConverterRegistry;
use crate::schema::RecordSchema;

/// Schema file: an ordered list of `[[fields]]` tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default)]
    pub cell_name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: TypeTag,
    /// Domain of an `enum` field, in ordinal order.
    #[serde(default)]
    pub variants: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub trim_input: bool,
    #[serde(default)]
    pub format: Option<String>,
    /// Converter-specific flag bits.
    #[serde(default)]
    pub flags: u64,
    /// Registry key overriding the type's default converter.
    #[serde(default)]
    pub converter: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl FieldConfig {
    fn declared_type(&self) -> Result<FieldType, SchemaError> {
        let field_type = match (self.field_type, &self.variants) {
            (TypeTag::Enum, Some(variants)) => FieldType::Enum(EnumDomain::new(variants.iter().cloned())?),
            (TypeTag::Enum, None) => {
                return Err(SchemaError::Config("enum field needs 'variants'".into()));
            }
            (tag, Some(_)) => {
                return Err(SchemaError::Config(format!("'variants' is only valid for enum fields, not {tag}")));
            }
            (TypeTag::Bool, None) => FieldType::Bool,
            (TypeTag::Char, None) => FieldType::Char,
            (TypeTag::String, None) => FieldType::String,
            (TypeTag::Int32, None) => FieldType::Int32,
            (TypeTag::Int64, None) => FieldType::Int64,
            (TypeTag::UInt64, None) => FieldType::UInt64,
            (TypeTag::Float32, None) => FieldType::Float32,
            (TypeTag::Float64, None) => FieldType::Float64,
            (TypeTag::Date, None) => FieldType::Date,
            (TypeTag::DateTime, None) => FieldType::DateTime,
        };
        Ok(field_type)
    }

    pub fn descriptor(&self) -> Result<FieldDescriptor, SchemaError> {
        let field_type = self.declared_type().map_err(|e| e.with_context(format_args!("field '{}'", self.name)))?;
        Ok(FieldDescriptor {
            name: self.name.clone(),
            cell_name: self.cell_name.clone(),
            field_type,
            required: self.required,
            trim_input: self.trim_input,
            format: self.format.clone(),
            flags: ConverterFlags::from_bits(self.flags),
            converter: self.converter.clone().map(ConverterRef::Named),
            default_value: self.default.clone(),
        })
    }
}

impl SchemaConfig {
    /// Load a schema from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse a schema from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, SchemaError> {
        toml::from_str(toml_str).map_err(|e| SchemaError::Config(e.to_string()))
    }

    pub fn descriptors(&self) -> Result<Vec<FieldDescriptor>, SchemaError> {
        self.fields.iter().map(FieldConfig::descriptor).collect()
    }

    /// Build a positional [`Row`] schema from this config.
    pub fn build(&self, registry: &ConverterRegistry) -> Result<RecordSchema<Row>, SchemaError> {
        let descriptors = self.descriptors()?;
        RecordSchema::from_descriptors(registry, descriptors)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    const TRADES: &str = r#"
[[fields]]
name = "id"
type = "uint64"
required = true

[[fields]]
name = "side"
cell_name = "Side"
type = "enum"
variants = ["buy", "sell", "unknown"]
format = "unknown"
flags = 2
trim_input = true

[[fields]]
name = "note"
type = "string"
converter = "string"
default = "-"
"#;

    #[test]
    fn parse_maps_every_key() {
        let config = SchemaConfig::parse(TRADES).unwrap();
        let descriptors = config.descriptors().unwrap();
        assert_eq!(descriptors.len(), 3);

        assert_eq!(descriptors[0].field_type, FieldType::UInt64);
        assert!(descriptors[0].required);

        let side = &descriptors[1];
        assert_eq!(side.cell_name(), "Side");
        assert_eq!(side.field_type.enum_domain().map(EnumDomain::len), Some(3));
        assert_eq!(side.format.as_deref(), Some("unknown"));
        assert_eq!(side.flags.bits(), 2);
        assert!(side.trim_input);

        assert!(matches!(&descriptors[2].converter, Some(ConverterRef::Named(k)) if k == "string"));
        assert_eq!(descriptors[2].default_value.as_deref(), Some("-"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRADES.as_bytes()).unwrap();
        let config = SchemaConfig::load(file.path()).unwrap();
        assert_eq!(config.fields.len(), 3);
        let schema = config.build(&ConverterRegistry::with_defaults()).unwrap();
        assert_eq!(schema.field("side").map(|f| f.converter_name()), Some("enum"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = SchemaConfig::load("/nonexistent/schema.toml").unwrap_err();
        assert!(matches!(err, SchemaError::Config(msg) if msg.starts_with("/nonexistent/schema.toml")));
    }

    #[rstest]
    #[case::enum_without_variants("name = \"c\"\ntype = \"enum\"", "enum field needs 'variants'")]
    #[case::variants_on_string("name = \"c\"\ntype = \"string\"\nvariants = [\"a\"]", "only valid for enum")]
    fn variants_must_match_type(#[case] entry: &str, #[case] expected: &str) {
        let config = SchemaConfig::parse(&format!("[[fields]]\n{entry}\n")).unwrap();
        let err = config.descriptors().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("field 'c'"), "{message}");
        assert!(message.contains(expected), "{message}");
    }

    #[rstest]
    #[case::unknown_key("[[fields]]\nname = \"a\"\ntype = \"string\"\ncolour = 1\n")]
    #[case::unknown_type("[[fields]]\nname = \"a\"\ntype = \"money\"\n")]
    #[case::missing_type("[[fields]]\nname = \"a\"\n")]
    fn malformed_toml_is_rejected(#[case] text: &str) {
        assert!(matches!(SchemaConfig::parse(text), Err(SchemaError::Config(_))));
    }

    #[test]
    fn duplicate_variants_are_converter_errors() {
        let config = SchemaConfig::parse("[[fields]]\nname = \"c\"\ntype = \"enum\"\nvariants = [\"a\", \"a\"]\n").unwrap();
        assert!(matches!(config.descriptors(), Err(SchemaError::Converter(_))));
    }
}
