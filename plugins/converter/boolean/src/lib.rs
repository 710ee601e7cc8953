use std::sync::Arc;

use tabula_api::converter::foreign_value;
use tabula_api::{
    ConfigError, Converter, ConverterFlags, DynConverter, FieldInfo, FieldType, ParseError, ParseErrorKind, Value,
};

const DEFAULT_TRUE: &str = "true";
const DEFAULT_FALSE: &str = "false";

/// Converter for `Bool` fields.
///
/// The format names the true and false texts, comma separated: `"T,F"`,
/// `"yes,no"`. Without a format they are `true` and `false`.
pub struct BooleanConverter;

impl BooleanConverter {
    /// Text matching neither the true nor the false text is an error.
    /// Without this flag such text reads as `false`.
    pub const PARSE_ERROR_ON_INVALID_VALUE: ConverterFlags = ConverterFlags::from_bits(1 << 1);
    /// Compare cell text case-sensitively.
    pub const CASE_SENSITIVE: ConverterFlags = ConverterFlags::from_bits(1 << 2);

    pub fn factory() -> Result<Arc<dyn DynConverter>, ConfigError> {
        Ok(Arc::new(BooleanConverter))
    }
}

pub struct BooleanConfig {
    true_text: String,
    false_text: String,
    parse_error_on_invalid: bool,
    case_sensitive: bool,
}

impl BooleanConfig {
    fn matches(&self, cell: &str, expected: &str) -> bool {
        if self.case_sensitive {
            cell == expected
        } else {
            cell.eq_ignore_ascii_case(expected)
        }
    }
}

impl Converter for BooleanConverter {
    type Config = BooleanConfig;

    fn name(&self) -> &'static str {
        "boolean"
    }

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<BooleanConfig, ConfigError> {
        if *declared != FieldType::Bool {
            return Err(ConfigError::incompatible_type(format!(
                "type {declared} improperly configured as a boolean"
            )));
        }
        let case_sensitive = flags.contains(Self::CASE_SENSITIVE);
        let (true_text, false_text) = match format {
            None => (DEFAULT_TRUE, DEFAULT_FALSE),
            Some(format) => match format.split_once(',') {
                Some((t, f)) if !t.is_empty() && !f.is_empty() && !f.contains(',') => (t, f),
                _ => {
                    return Err(ConfigError::invalid_format(format!(
                        "boolean format must be 'TRUE,FALSE', got '{format}'"
                    )));
                }
            },
        };
        let same = if case_sensitive {
            true_text == false_text
        } else {
            true_text.eq_ignore_ascii_case(false_text)
        };
        if same {
            return Err(ConfigError::invalid_format(format!(
                "boolean true and false texts must differ, got '{true_text}' for both"
            )));
        }
        Ok(BooleanConfig {
            true_text: true_text.to_string(),
            false_text: false_text.to_string(),
            parse_error_on_invalid: flags.contains(Self::PARSE_ERROR_ON_INVALID_VALUE),
            case_sensitive,
        })
    }

    fn needs_quotes(&self, _config: &BooleanConfig) -> bool {
        false
    }

    fn value_to_text(&self, field: &FieldInfo, config: &BooleanConfig, value: Option<&Value>) -> Option<String> {
        match value? {
            Value::Bool(true) => Some(config.true_text.clone()),
            Value::Bool(false) => Some(config.false_text.clone()),
            other => foreign_value(Converter::name(self), field, other),
        }
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        _field: &FieldInfo,
        config: &BooleanConfig,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        if config.matches(cell, &config.true_text) {
            return Some(Value::Bool(true));
        }
        if !config.parse_error_on_invalid || config.matches(cell, &config.false_text) {
            return Some(Value::Bool(false));
        }
        parse_error.set(ParseErrorKind::InvalidFormat, cell, line, line_number);
        None
    }
}
