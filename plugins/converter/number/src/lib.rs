use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use tabula_api::converter::foreign_value;
use tabula_api::{
    ConfigError, Converter, ConverterFlags, DynConverter, FieldInfo, FieldType, ParseError, ParseErrorKind, Value,
};

/// Converter for integer and floating-point fields.
///
/// Format (floating-point types only): `.N` writes exactly `N` fractional
/// digits. That output is lossy: reading it back gives the rounded value.
/// Integer types take no format.
pub struct NumberConverter;

impl NumberConverter {
    /// Accept `,` digit grouping on read (`1,234,567`). Output is never grouped.
    pub const ALLOW_THOUSANDS_SEPARATOR: ConverterFlags = ConverterFlags::from_bits(1 << 1);

    pub fn factory() -> Result<Arc<dyn DynConverter>, ConfigError> {
        Ok(Arc::new(NumberConverter))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberKind {
    Int32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl NumberKind {
    fn is_float(self) -> bool {
        matches!(self, NumberKind::Float32 | NumberKind::Float64)
    }
}

pub struct NumberConfig {
    kind: NumberKind,
    precision: Option<usize>,
    thousands_separator: bool,
}

fn parse_precision(format: &str) -> Result<usize, ConfigError> {
    format
        .strip_prefix('.')
        .and_then(|digits| digits.parse::<usize>().ok())
        .filter(|p| *p <= 17)
        .ok_or_else(|| {
            ConfigError::invalid_format(format!(
                "number format must be '.N' with N in 0..=17, got '{format}'"
            ))
        })
}

fn parse_cell<T: FromStr>(text: &str) -> Option<T> {
    text.parse::<T>().ok()
}

impl Converter for NumberConverter {
    type Config = NumberConfig;

    fn name(&self) -> &'static str {
        "number"
    }

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<NumberConfig, ConfigError> {
        let kind = match declared {
            FieldType::Int32 => NumberKind::Int32,
            FieldType::Int64 => NumberKind::Int64,
            FieldType::UInt64 => NumberKind::UInt64,
            FieldType::Float32 => NumberKind::Float32,
            FieldType::Float64 => NumberKind::Float64,
            other => {
                return Err(ConfigError::incompatible_type(format!(
                    "type {other} improperly configured as a number"
                )));
            }
        };
        let precision = match format {
            None => None,
            Some(f) if kind.is_float() => Some(parse_precision(f)?),
            Some(f) => {
                return Err(ConfigError::invalid_format(format!(
                    "integer type {declared} takes no format, got '{f}'"
                )));
            }
        };
        Ok(NumberConfig {
            kind,
            precision,
            thousands_separator: flags.contains(Self::ALLOW_THOUSANDS_SEPARATOR),
        })
    }

    fn needs_quotes(&self, _config: &NumberConfig) -> bool {
        false
    }

    fn value_to_text(&self, field: &FieldInfo, config: &NumberConfig, value: Option<&Value>) -> Option<String> {
        let value = value?;
        match (config.kind, value, config.precision) {
            (NumberKind::Int32, Value::Int32(v), _) => Some(v.to_string()),
            (NumberKind::Int64, Value::Int64(v), _) => Some(v.to_string()),
            (NumberKind::UInt64, Value::UInt64(v), _) => Some(v.to_string()),
            (NumberKind::Float32, Value::Float32(v), Some(p)) => Some(format!("{v:.p$}")),
            (NumberKind::Float32, Value::Float32(v), None) => Some(v.to_string()),
            (NumberKind::Float64, Value::Float64(v), Some(p)) => Some(format!("{v:.p$}")),
            (NumberKind::Float64, Value::Float64(v), None) => Some(v.to_string()),
            (_, other, _) => foreign_value(Converter::name(self), field, other),
        }
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        _field: &FieldInfo,
        config: &NumberConfig,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        let text: Cow<'_, str> = if config.thousands_separator && cell.contains(',') {
            Cow::Owned(cell.replace(',', ""))
        } else {
            Cow::Borrowed(cell)
        };
        let parsed = match config.kind {
            NumberKind::Int32 => parse_cell(&text).map(Value::Int32),
            NumberKind::Int64 => parse_cell(&text).map(Value::Int64),
            NumberKind::UInt64 => parse_cell(&text).map(Value::UInt64),
            NumberKind::Float32 => parse_cell(&text).map(Value::Float32),
            NumberKind::Float64 => parse_cell(&text).map(Value::Float64),
        };
        if parsed.is_none() {
            parse_error.set(ParseErrorKind::InvalidFormat, cell, line, line_number);
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;
    use tabula_api::{ErrorKind, FieldDescriptor};

    use super::*;

    fn field(descriptor: FieldDescriptor) -> FieldInfo {
        FieldInfo::configure(descriptor, Arc::new(NumberConverter)).unwrap()
    }

    fn read(f: &FieldInfo, cell: &str) -> (Option<Value>, ParseError) {
        let mut err = ParseError::new();
        let value = f.text_to_value(cell, 1, cell, &mut err);
        (value, err)
    }

    #[rstest]
    #[case(FieldType::Int32, "-42", Value::Int32(-42))]
    #[case(FieldType::Int64, "9000000000", Value::Int64(9_000_000_000))]
    #[case(FieldType::UInt64, "18446744073709551615", Value::UInt64(u64::MAX))]
    #[case(FieldType::Float32, "1.5", Value::Float32(1.5))]
    #[case(FieldType::Float64, "-0.25", Value::Float64(-0.25))]
    fn reads_declared_type(#[case] declared: FieldType, #[case] cell: &str, #[case] expected: Value) {
        let (value, err) = read(&field(FieldDescriptor::new("n", declared)), cell);
        assert_eq!(value, Some(expected));
        assert!(!err.is_set());
    }

    #[rstest]
    #[case(FieldType::Int32, "3000000000")]
    #[case(FieldType::UInt64, "-1")]
    #[case(FieldType::Int64, "12abc")]
    #[case(FieldType::Float64, "one")]
    #[case(FieldType::Int64, "1,000")]
    fn bad_text_is_invalid_format(#[case] declared: FieldType, #[case] cell: &str) {
        let (value, err) = read(&field(FieldDescriptor::new("n", declared)), cell);
        assert_eq!(value, None);
        assert_eq!(err.kind(), Some(ParseErrorKind::InvalidFormat));
        assert_eq!(err.message(), cell);
    }

    #[test]
    fn thousands_separator_flag() {
        let f = field(
            FieldDescriptor::new("n", FieldType::Int64).with_flags(NumberConverter::ALLOW_THOUSANDS_SEPARATOR),
        );
        let (value, err) = read(&f, "1,234,567");
        assert_eq!(value, Some(Value::Int64(1_234_567)));
        assert!(!err.is_set());
        assert_eq!(f.value_to_text(value.as_ref()), Some("1234567".into()));
    }

    #[test]
    fn precision_format_is_lossy() {
        let f = field(FieldDescriptor::new("price", FieldType::Float64).with_format(".2"));
        assert_eq!(f.value_to_text(Some(&Value::Float64(1.23456))), Some("1.23".into()));
        assert_eq!(f.value_to_text(Some(&Value::Float64(2.0))), Some("2.00".into()));
        let (value, _) = read(&f, "1.23");
        assert_eq!(value, Some(Value::Float64(1.23)));
    }

    #[rstest]
    #[case(FieldType::Float64, "2")]
    #[case(FieldType::Float64, ".x")]
    #[case(FieldType::Float64, ".99")]
    #[case(FieldType::Int32, ".2")]
    fn bad_formats_are_rejected(#[case] declared: FieldType, #[case] format: &str) {
        let err = FieldInfo::configure(
            FieldDescriptor::new("n", declared).with_format(format),
            Arc::new(NumberConverter),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn non_numeric_type_is_rejected() {
        let err = FieldInfo::configure(FieldDescriptor::new("n", FieldType::Date), Arc::new(NumberConverter))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatibleType);
    }

    #[test]
    fn never_quoted_and_absent_is_absent() {
        let f = field(FieldDescriptor::new("n", FieldType::Int64));
        assert!(!f.needs_quotes());
        assert_eq!(f.value_to_text(None), None);
        let (value, err) = read(&f, "");
        assert_eq!(value, None);
        assert!(!err.is_set());
    }

    proptest! {
        #[test]
        fn int64_round_trips(v in any::<i64>()) {
            let f = field(FieldDescriptor::new("n", FieldType::Int64));
            let text = f.value_to_text(Some(&Value::Int64(v))).unwrap_or_default();
            prop_assert_eq!(read(&f, &text).0, Some(Value::Int64(v)));
        }

        #[test]
        fn float64_round_trips(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let f = field(FieldDescriptor::new("n", FieldType::Float64));
            let text = f.value_to_text(Some(&Value::Float64(v))).unwrap_or_default();
            prop_assert_eq!(read(&f, &text).0, Some(Value::Float64(v)));
        }
    }
}
