use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::converter::{ConfigInfo, DynConverter};
use crate::error::ConfigError;
use crate::flags::ConverterFlags;
use crate::parse_error::{ParseError, ParseErrorKind};
use crate::schema::{FieldDescriptor, FieldType};
use crate::value::Value;

/// Compiled binding of one field: descriptor + converter + the converter's
/// configuration.
///
/// Built once per field per record type and then shared read-only by every
/// conversion of that type. Cloning is cheap.
#[derive(Clone)]
pub struct FieldInfo {
    descriptor: Arc<FieldDescriptor>,
    converter: Arc<dyn DynConverter>,
    config: ConfigInfo,
    needs_quotes: bool,
}

impl FieldInfo {
    /// Bind `descriptor` to `converter`, running the converter's
    /// configuration step exactly once.
    pub fn configure(descriptor: FieldDescriptor, converter: Arc<dyn DynConverter>) -> Result<Self, ConfigError> {
        let config = converter.configure(
            descriptor.format.as_deref(),
            descriptor.flags,
            &descriptor.field_type,
        )?;
        let needs_quotes = converter.needs_quotes(config.as_ref());
        Ok(Self {
            descriptor: Arc::new(descriptor),
            converter,
            config,
            needs_quotes,
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn cell_name(&self) -> &str {
        self.descriptor.cell_name()
    }

    pub fn field_type(&self) -> &FieldType {
        &self.descriptor.field_type
    }

    pub fn is_required(&self) -> bool {
        self.descriptor.required
    }

    pub fn is_trim_input(&self) -> bool {
        self.descriptor.trim_input
    }

    pub fn format(&self) -> Option<&str> {
        self.descriptor.format.as_deref()
    }

    pub fn flags(&self) -> ConverterFlags {
        self.descriptor.flags
    }

    /// Raw default text, `None` when unset.
    pub fn default_value(&self) -> Option<&str> {
        self.descriptor.default_value.as_deref()
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn converter_name(&self) -> &'static str {
        self.converter.name()
    }

    /// The configuration produced by this field's converter.
    pub fn config_info(&self) -> &(dyn Any + Send + Sync) {
        self.config.as_ref()
    }

    pub fn needs_quotes(&self) -> bool {
        self.needs_quotes
    }

    pub fn value_to_text(&self, value: Option<&Value>) -> Option<String> {
        self.converter.value_to_text(self, value)
    }

    /// Convert one cell exactly as given. Empty text yields `None`.
    pub fn text_to_value(
        &self,
        line: &str,
        line_number: u64,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        self.converter.text_to_value(line, line_number, self, cell, parse_error)
    }

    /// Convert one cell with the descriptor's cell policy applied first:
    ///
    /// 1. trim surrounding whitespace if `trim_input` is set;
    /// 2. an empty cell takes the default text, if one is set;
    /// 3. a required field that is still empty reports
    ///    `RequiredButMissing` with the cell name as message.
    pub fn read_cell(
        &self,
        line: &str,
        line_number: u64,
        cell: &str,
        parse_error: &mut ParseError,
    ) -> Option<Value> {
        let mut text = if self.is_trim_input() { cell.trim() } else { cell };
        if text.is_empty() {
            if let Some(default) = self.default_value() {
                text = default;
            }
        }
        if text.is_empty() {
            if self.is_required() {
                parse_error.set(ParseErrorKind::RequiredButMissing, self.cell_name(), line, line_number);
            }
            return None;
        }
        self.text_to_value(line, line_number, text, parse_error)
    }

    /// Text of `value` ready for the line writer: `Cow::Borrowed("")` for an
    /// absent value.
    pub fn write_cell(&self, value: Option<&Value>) -> Cow<'static, str> {
        match self.value_to_text(value) {
            Some(text) => Cow::Owned(text),
            None => Cow::Borrowed(""),
        }
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.descriptor.name)
            .field("field_type", &self.descriptor.field_type)
            .field("converter", &self.converter.name())
            .field("needs_quotes", &self.needs_quotes)
            .finish()
    }
}
