use std::sync::Arc;

use tabula_api::converter::foreign_value;
use tabula_api::{
    ConfigError, Converter, ConverterFlags, DynConverter, FieldInfo, FieldType, ParseError, ParseErrorKind, Value,
};

/// Converter for `String` and `Char` fields. The cell text is the value.
pub struct StringConverter;

impl StringConverter {
    /// Always quote the written cell.
    pub const NEEDS_QUOTES: ConverterFlags = ConverterFlags::from_bits(1 << 1);

    pub fn factory() -> Result<Arc<dyn DynConverter>, ConfigError> {
        Ok(Arc::new(StringConverter))
    }
}

pub struct StringConfig {
    single_char: bool,
    needs_quotes: bool,
}

impl Converter for StringConverter {
    type Config = StringConfig;

    fn name(&self) -> &'static str {
        "string"
    }

    fn configure(
        &self,
        _format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<StringConfig, ConfigError> {
        let single_char = match declared {
            FieldType::String => false,
            FieldType::Char => true,
            other => {
                return Err(ConfigError::incompatible_type(format!(
                    "type {other} improperly configured as a string"
                )));
            }
        };
        Ok(StringConfig {
            single_char,
            needs_quotes: flags.contains(Self::NEEDS_QUOTES),
        })
    }

    fn needs_quotes(&self, config: &StringConfig) -> bool {
        config.needs_quotes
    }

    fn value_to_text(&self, field: &FieldInfo, _config: &StringConfig, value: Option<&Value>) -> Option<String> {
        match value? {
            Value::String(s) => Some(s.clone()),
            Value::Char(c) => Some(c.to_string()),
            other => foreign_value(Converter::name(self), field, other),
        }
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        _field: &FieldInfo,
        config: &StringConfig,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        if !config.single_char {
            return Some(Value::String(cell.to_string()));
        }
        let mut chars = cell.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Value::Char(c)),
            _ => {
                parse_error.set(ParseErrorKind::TruncatedValue, cell, line, line_number);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tabula_api::{ErrorKind, FieldDescriptor};

    use super::*;

    fn field(descriptor: FieldDescriptor) -> FieldInfo {
        FieldInfo::configure(descriptor, Arc::new(StringConverter)).unwrap()
    }

    #[test]
    fn text_is_kept_verbatim() {
        let f = field(FieldDescriptor::new("s", FieldType::String));
        let mut err = ParseError::new();
        assert_eq!(
            f.text_to_value("", 1, " a, b ", &mut err),
            Some(Value::String(" a, b ".into()))
        );
        assert_eq!(f.text_to_value("", 1, "", &mut err), None);
        assert_eq!(f.value_to_text(None), None);
        assert!(!err.is_set());
    }

    #[test]
    fn char_accepts_exactly_one_character() {
        let f = field(FieldDescriptor::new("c", FieldType::Char));
        let mut err = ParseError::new();
        assert_eq!(f.text_to_value("", 1, "é", &mut err), Some(Value::Char('é')));
        assert!(!err.is_set());

        assert_eq!(f.text_to_value("xy", 3, "xy", &mut err), None);
        assert_eq!(err.kind(), Some(ParseErrorKind::TruncatedValue));
        assert_eq!(err.message(), "xy");
    }

    #[test]
    fn quoting_follows_flag() {
        let plain = field(FieldDescriptor::new("s", FieldType::String));
        let quoted = field(FieldDescriptor::new("s", FieldType::String).with_flags(StringConverter::NEEDS_QUOTES));
        assert!(!plain.needs_quotes());
        assert!(quoted.needs_quotes());
    }

    #[test]
    fn numeric_type_is_rejected() {
        let err = FieldInfo::configure(FieldDescriptor::new("n", FieldType::Float64), Arc::new(StringConverter))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleType);
    }

    proptest! {
        #[test]
        fn strings_round_trip(s in ".+") {
            let f = field(FieldDescriptor::new("s", FieldType::String));
            let mut err = ParseError::new();
            let text = f.value_to_text(Some(&Value::String(s.clone())));
            prop_assert_eq!(
                f.text_to_value("", 1, text.as_deref().unwrap_or(""), &mut err),
                Some(Value::String(s))
            );
        }

        #[test]
        fn chars_round_trip(c in any::<char>()) {
            let f = field(FieldDescriptor::new("c", FieldType::Char));
            let mut err = ParseError::new();
            let text = f.value_to_text(Some(&Value::Char(c)));
            prop_assert_eq!(
                f.text_to_value("", 1, text.as_deref().unwrap_or(""), &mut err),
                Some(Value::Char(c))
            );
        }
    }
}
