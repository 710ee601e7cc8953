use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tabula_api::converter::foreign_value;
use tabula_api::{
    ConfigError, Converter, ConverterFlags, DynConverter, FieldInfo, FieldType, ParseError, ParseErrorKind, Value,
};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converter for `Date` and `DateTime` fields.
///
/// The format is a chrono `strftime` pattern. Patterns that drop fields
/// (e.g. no seconds) are lossy: the dropped fields read back as zero.
pub struct DateConverter;

impl DateConverter {
    /// Always quote the written cell (for patterns containing separators
    /// that clash with the line grammar).
    pub const NEEDS_QUOTES: ConverterFlags = ConverterFlags::from_bits(1 << 1);

    pub fn factory() -> Result<Arc<dyn DynConverter>, ConfigError> {
        Ok(Arc::new(DateConverter))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    Date,
    DateTime,
}

pub struct DateConfig {
    kind: DateKind,
    pattern: String,
    needs_quotes: bool,
}

impl DateConfig {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

fn render(kind: DateKind, pattern: &str, value: &Value) -> Result<Option<String>, std::fmt::Error> {
    let mut out = String::new();
    match (kind, value) {
        (DateKind::Date, Value::Date(d)) => write!(out, "{}", d.format(pattern))?,
        (DateKind::DateTime, Value::DateTime(dt)) => write!(out, "{}", dt.format(pattern))?,
        _ => return Ok(None),
    }
    Ok(Some(out))
}

fn parse(kind: DateKind, pattern: &str, text: &str) -> Option<Value> {
    match kind {
        DateKind::Date => NaiveDate::parse_from_str(text, pattern).ok().map(Value::Date),
        DateKind::DateTime => NaiveDateTime::parse_from_str(text, pattern).ok().map(Value::DateTime),
    }
}

/// Check that `pattern` can both write and read back a sample value.
fn validate_pattern(kind: DateKind, pattern: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::invalid_format(format!("date pattern '{pattern}' is not usable for {kind:?}"));
    let date = NaiveDate::from_ymd_opt(2001, 2, 3).ok_or_else(invalid)?;
    let time = NaiveTime::from_hms_opt(4, 5, 6).ok_or_else(invalid)?;
    let sample = match kind {
        DateKind::Date => Value::Date(date),
        DateKind::DateTime => Value::DateTime(date.and_time(time)),
    };
    let text = render(kind, pattern, &sample).ok().flatten().ok_or_else(invalid)?;
    parse(kind, pattern, &text).ok_or_else(invalid)?;
    Ok(())
}

impl Converter for DateConverter {
    type Config = DateConfig;

    fn name(&self) -> &'static str {
        "date"
    }

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<DateConfig, ConfigError> {
        let (kind, default_pattern) = match declared {
            FieldType::Date => (DateKind::Date, DEFAULT_DATE_FORMAT),
            FieldType::DateTime => (DateKind::DateTime, DEFAULT_DATETIME_FORMAT),
            other => {
                return Err(ConfigError::incompatible_type(format!(
                    "type {other} improperly configured as a date"
                )));
            }
        };
        let pattern = format.unwrap_or(default_pattern);
        validate_pattern(kind, pattern)?;
        Ok(DateConfig {
            kind,
            pattern: pattern.to_string(),
            needs_quotes: flags.contains(Self::NEEDS_QUOTES),
        })
    }

    fn needs_quotes(&self, config: &DateConfig) -> bool {
        config.needs_quotes
    }

    fn value_to_text(&self, field: &FieldInfo, config: &DateConfig, value: Option<&Value>) -> Option<String> {
        let value = value?;
        match render(config.kind, &config.pattern, value) {
            Ok(Some(text)) => Some(text),
            Ok(None) => foreign_value(Converter::name(self), field, value),
            Err(_) => {
                tracing::error!(field = %field.name(), pattern = %config.pattern, "date formatting failed");
                None
            }
        }
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        _field: &FieldInfo,
        config: &DateConfig,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        if cell.is_empty() {
            return None;
        }
        let parsed = parse(config.kind, &config.pattern, cell);
        if parsed.is_none() {
            parse_error.set(ParseErrorKind::InvalidFormat, cell, line, line_number);
        }
        parsed
    }
}
