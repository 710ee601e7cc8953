use std::collections::HashMap;
use std::sync::Arc;

use tabula_api::converter::foreign_value;
use tabula_api::{
    ConfigError, Converter, ConverterFlags, DynConverter, EnumValue, FieldInfo, FieldType, ParseError,
    ParseErrorKind, Value,
};

/// Converter for categorical fields, a closed set of symbolic names.
///
/// Cells hold the canonical name of a domain member. With
/// [`EnumConverter::FORMAT_IS_UNKNOWN_VALUE`] the format string names the
/// member used for any cell text outside the domain.
pub struct EnumConverter;

impl EnumConverter {
    /// The format string is the name of the value read for unknown cells.
    ///
    /// E.g. with domain `red|green|blue` and format `"blue"`, the cell
    /// `"yellow"` reads as `blue` instead of failing.
    pub const FORMAT_IS_UNKNOWN_VALUE: ConverterFlags = ConverterFlags::from_bits(1 << 1);

    pub fn factory() -> Result<Arc<dyn DynConverter>, ConfigError> {
        Ok(Arc::new(EnumConverter))
    }
}

pub struct EnumConfig {
    by_name: HashMap<String, EnumValue>,
    unknown_value: Option<EnumValue>,
}

impl EnumConfig {
    pub fn unknown_value(&self) -> Option<&EnumValue> {
        self.unknown_value.as_ref()
    }
}

impl Converter for EnumConverter {
    type Config = EnumConfig;

    fn name(&self) -> &'static str {
        "enum"
    }

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<EnumConfig, ConfigError> {
        let Some(domain) = declared.enum_domain() else {
            return Err(ConfigError::incompatible_type(format!(
                "type {declared} improperly configured as an enum"
            )));
        };
        let by_name: HashMap<String, EnumValue> =
            domain.values().map(|v| (v.name.clone(), v)).collect();

        let mut unknown_value = None;
        if flags.contains(Self::FORMAT_IS_UNKNOWN_VALUE) {
            let symbol = format.unwrap_or_default();
            match by_name.get(symbol) {
                Some(v) => unknown_value = Some(v.clone()),
                None => {
                    return Err(ConfigError::invalid_format(format!(
                        "format string '{symbol}' is not a valid enum value for {declared}"
                    )));
                }
            }
        }

        Ok(EnumConfig { by_name, unknown_value })
    }

    fn needs_quotes(&self, _config: &EnumConfig) -> bool {
        true
    }

    fn value_to_text(&self, field: &FieldInfo, _config: &EnumConfig, value: Option<&Value>) -> Option<String> {
        match value? {
            Value::Enum(v) => Some(v.name.clone()),
            other => foreign_value(Converter::name(self), field, other),
        }
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        _field: &FieldInfo,
        config: &EnumConfig,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        if let Some(v) = config.by_name.get(cell) {
            return Some(Value::Enum(v.clone()));
        }
        if let Some(v) = &config.unknown_value {
            return Some(Value::Enum(v.clone()));
        }
        parse_error.set(ParseErrorKind::InvalidFormat, cell, line, line_number);
        None
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;
    use tabula_api::{EnumDomain, ErrorKind, FieldDescriptor};

    use super::*;

    fn colors(names: &[&str]) -> FieldType {
        FieldType::Enum(EnumDomain::new(names.iter().copied()).unwrap())
    }

    fn field(descriptor: FieldDescriptor) -> FieldInfo {
        FieldInfo::configure(descriptor, Arc::new(EnumConverter)).unwrap()
    }

    fn read(field: &FieldInfo, cell: &str, err: &mut ParseError) -> Option<Value> {
        field.text_to_value(cell, 1, cell, err)
    }

    #[test]
    fn known_names_read_and_write() {
        let f = field(FieldDescriptor::new("color", colors(&["red", "green"])));
        let mut err = ParseError::new();
        let green = read(&f, "green", &mut err);
        assert_eq!(green, Some(Value::Enum(EnumValue::new(1, "green"))));
        assert!(!err.is_set());
        assert_eq!(f.value_to_text(green.as_ref()), Some("green".to_string()));
    }

    #[test]
    fn absence_is_symmetric() {
        let f = field(FieldDescriptor::new("color", colors(&["red", "green"])));
        let mut err = ParseError::new();
        assert_eq!(f.value_to_text(None), None);
        assert_eq!(read(&f, "", &mut err), None);
        assert!(!err.is_set());
    }

    #[test]
    fn unknown_text_falls_back_when_flag_set() {
        let f = field(
            FieldDescriptor::new("color", colors(&["red", "green", "blue"]))
                .with_flags(EnumConverter::FORMAT_IS_UNKNOWN_VALUE)
                .with_format("blue"),
        );
        let mut err = ParseError::new();
        assert_eq!(read(&f, "yellow", &mut err), Some(Value::Enum(EnumValue::new(2, "blue"))));
        assert!(!err.is_set());
    }

    #[test]
    fn unknown_text_is_invalid_format_without_flag() {
        // Format alone does nothing without the flag.
        let f = field(FieldDescriptor::new("color", colors(&["red", "green", "blue"])).with_format("blue"));
        let mut err = ParseError::new();
        assert_eq!(f.text_to_value("1,yellow", 7, "yellow", &mut err), None);
        assert_eq!(err.kind(), Some(ParseErrorKind::InvalidFormat));
        assert_eq!(err.message(), "yellow");
        assert_eq!(err.line(), "1,yellow");
        assert_eq!(err.line_number(), 7);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let f = field(FieldDescriptor::new("color", colors(&["red", "green"])));
        let mut err = ParseError::new();
        assert_eq!(read(&f, "RED", &mut err), None);
        assert_eq!(err.kind(), Some(ParseErrorKind::InvalidFormat));
    }

    #[rstest]
    #[case(FieldType::String)]
    #[case(FieldType::Int64)]
    #[case(FieldType::Bool)]
    fn non_enumerable_type_is_rejected(#[case] declared: FieldType) {
        let err = FieldInfo::configure(FieldDescriptor::new("color", declared), Arc::new(EnumConverter))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleType);
    }

    #[test]
    fn bad_fallback_symbol_is_rejected_by_name() {
        let err = FieldInfo::configure(
            FieldDescriptor::new("color", colors(&["red", "green"]))
                .with_flags(EnumConverter::FORMAT_IS_UNKNOWN_VALUE)
                .with_format("purple"),
            Arc::new(EnumConverter),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert!(err.message().contains("'purple'"), "{err}");
    }

    #[test]
    fn fallback_flag_without_format_is_rejected() {
        let err = FieldInfo::configure(
            FieldDescriptor::new("color", colors(&["red", "green"]))
                .with_flags(EnumConverter::FORMAT_IS_UNKNOWN_VALUE),
            Arc::new(EnumConverter),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[rstest]
    fn always_needs_quotes(
        #[values(ConverterFlags::NONE, EnumConverter::FORMAT_IS_UNKNOWN_VALUE, ConverterFlags::from_bits(1 << 5))]
        flags: ConverterFlags,
        #[values(None, Some("red"), Some("green"))] format: Option<&str>,
    ) {
        let mut descriptor = FieldDescriptor::new("color", colors(&["red", "green"])).with_flags(flags);
        descriptor.format = format.map(str::to_string);
        match FieldInfo::configure(descriptor, Arc::new(EnumConverter)) {
            Ok(f) => assert!(f.needs_quotes()),
            // fallback flag with no fallback symbol
            Err(_) => assert!(flags.contains(EnumConverter::FORMAT_IS_UNKNOWN_VALUE) && format.is_none()),
        }
    }

    #[test]
    fn foreign_value_writes_absent() {
        let f = field(FieldDescriptor::new("color", colors(&["red", "green"])));
        assert_eq!(f.value_to_text(Some(&Value::Int64(1))), None);
    }

    proptest! {
        #[test]
        fn every_domain_member_round_trips(
            names in proptest::collection::hash_set("[a-z][a-z0-9_]{0,8}", 1..8),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let domain = EnumDomain::new(names.clone()).unwrap();
            let f = field(FieldDescriptor::new("e", FieldType::Enum(domain.clone())));
            let mut err = ParseError::new();
            for v in domain.values() {
                let text = f.value_to_text(Some(&Value::Enum(v.clone())));
                let back = f.text_to_value("", 1, text.as_deref().unwrap_or(""), &mut err);
                prop_assert_eq!(back, Some(Value::Enum(v)));
                prop_assert!(!err.is_set());
            }
        }
    }
}
