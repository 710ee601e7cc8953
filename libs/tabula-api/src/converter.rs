use std::any::Any;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::field::FieldInfo;
use crate::flags::ConverterFlags;
use crate::parse_error::{ParseError, ParseErrorKind};
use crate::schema::FieldType;
use crate::value::Value;

/// Per-field converter configuration, type-erased.
///
/// Built once by [`DynConverter::configure`] and never mutated afterwards.
pub type ConfigInfo = Arc<dyn Any + Send + Sync>;

/// Constructor for a converter. Takes no arguments: a converter must be
/// constructible without external state.
pub type ConverterFactory = fn() -> Result<Arc<dyn DynConverter>, ConfigError>;

/// Field-level text ↔ value converter for one type family.
///
/// Converters are stateless; everything derived from a field's format,
/// flags and declared type lives in `Self::Config`, computed once by
/// `configure` and handed back on every conversion.
///
/// Contract shared by every family:
/// - `value_to_text(None)` is `None`; `text_to_value("")` is `None` with the
///   parse error left untouched.
/// - Data errors are reported by setting `parse_error` exactly once and
///   returning `None`, never by panicking.
/// - Configuration errors happen only in `configure`.
pub trait Converter: Send + Sync + 'static {
    type Config: Send + Sync + 'static;

    /// Converter name for logs and schema descriptions.
    fn name(&self) -> &'static str;

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<Self::Config, ConfigError>;

    /// Output must always be quoted on write, whatever the content.
    fn needs_quotes(&self, config: &Self::Config) -> bool;

    fn value_to_text(&self, field: &FieldInfo, config: &Self::Config, value: Option<&Value>) -> Option<String>;

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        field: &FieldInfo,
        config: &Self::Config,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value>;
}

/// Object-safe form of [`Converter`], stored in a [`FieldInfo`].
///
/// Implemented for every `Converter`; the configuration is recovered from
/// the `FieldInfo` that the converter itself configured.
pub trait DynConverter: Send + Sync {
    fn name(&self) -> &'static str;

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<ConfigInfo, ConfigError>;

    fn needs_quotes(&self, config: &(dyn Any + Send + Sync)) -> bool;

    fn value_to_text(&self, field: &FieldInfo, value: Option<&Value>) -> Option<String>;

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        field: &FieldInfo,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value>;
}

impl<C: Converter> DynConverter for C {
    fn name(&self) -> &'static str {
        Converter::name(self)
    }

    fn configure(
        &self,
        format: Option<&str>,
        flags: ConverterFlags,
        declared: &FieldType,
    ) -> Result<ConfigInfo, ConfigError> {
        let config = Converter::configure(self, format, flags, declared)?;
        Ok(Arc::new(config))
    }

    fn needs_quotes(&self, config: &(dyn Any + Send + Sync)) -> bool {
        match config.downcast_ref::<C::Config>() {
            Some(config) => Converter::needs_quotes(self, config),
            None => {
                tracing::error!(converter = Converter::name(self), "configuration belongs to another converter");
                true
            }
        }
    }

    fn value_to_text(&self, field: &FieldInfo, value: Option<&Value>) -> Option<String> {
        let Some(config) = field.config_info().downcast_ref::<C::Config>() else {
            tracing::error!(
                field = %field.name(),
                converter = Converter::name(self),
                "configuration belongs to another converter"
            );
            return None;
        };
        Converter::value_to_text(self, field, config, value)
    }

    fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        field: &FieldInfo,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        let Some(config) = field.config_info().downcast_ref::<C::Config>() else {
            tracing::error!(
                field = %field.name(),
                converter = Converter::name(self),
                "configuration belongs to another converter"
            );
            parse_error.set(
                ParseErrorKind::InternalError,
                format!("converter '{}' invoked with a foreign configuration", Converter::name(self)),
                line,
                line_number,
            );
            return None;
        };
        Converter::text_to_value(self, line, line_number, field, config, cell, parse_error)
    }
}

/// Write-path answer for a value outside the converter's legal domain.
///
/// That is a schema bug on the caller's side; it is logged and the cell is
/// written as absent.
pub fn foreign_value(converter: &str, field: &FieldInfo, value: &Value) -> Option<String> {
    tracing::error!(
        field = %field.name(),
        converter,
        value_type = value.type_name(),
        "value outside the converter's domain"
    );
    None
}
