use std::collections::HashMap;
use std::fmt;

use tabula_api::{
    ConfigError, ConverterRef, FieldDescriptor, FieldInfo, ParseError, ParseErrorKind, Row, Value,
};

use crate::error::SchemaError;
use crate::registry::{self, ConverterRegistry};

/// Reads a field's value out of a record.
pub type Getter<R> = Box<dyn Fn(&R) -> Option<Value> + Send + Sync>;
/// Stores a converted value into a record.
pub type Setter<R> = Box<dyn Fn(&mut R, Option<Value>) + Send + Sync>;

/// Resolve the converter for one descriptor and configure it.
///
/// Resolution order: explicit factory, explicit registry key, registry
/// default for the declared type.
pub fn compile_field(registry: &ConverterRegistry, descriptor: FieldDescriptor) -> Result<FieldInfo, ConfigError> {
    let converter = match &descriptor.converter {
        Some(ConverterRef::Factory(factory)) => {
            factory().map_err(|e| e.with_context("converter override"))?
        }
        Some(ConverterRef::Named(key)) => registry.resolve_key(key)?,
        None => registry.resolve_default(&descriptor.field_type)?,
    };
    let field = FieldInfo::configure(descriptor, converter)?;
    tracing::debug!(
        field = %field.name(),
        converter = field.converter_name(),
        field_type = %field.field_type(),
        "compiled field"
    );
    Ok(field)
}

struct BoundField<R> {
    info: FieldInfo,
    get: Getter<R>,
    set: Setter<R>,
}

/// Ordered list of field declarations for record type `R`, compiled in one
/// go by [`SchemaBuilder::build`].
pub struct SchemaBuilder<'r, R> {
    registry: &'r ConverterRegistry,
    pending: Vec<(FieldDescriptor, Getter<R>, Setter<R>)>,
}

impl<R> SchemaBuilder<'static, R> {
    /// Builder resolving converters through the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(registry::global())
    }
}

impl<R> Default for SchemaBuilder<'static, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, R> SchemaBuilder<'r, R> {
    pub fn with_registry(registry: &'r ConverterRegistry) -> Self {
        Self { registry, pending: Vec::new() }
    }

    /// Declare the next field with its accessor and mutator.
    pub fn field<G, S>(mut self, descriptor: FieldDescriptor, get: G, set: S) -> Self
    where
        G: Fn(&R) -> Option<Value> + Send + Sync + 'static,
        S: Fn(&mut R, Option<Value>) + Send + Sync + 'static,
    {
        self.pending.push((descriptor, Box::new(get), Box::new(set)));
        self
    }

    /// Compile every declared field. The first configuration error aborts
    /// the build; no partial schema is returned.
    pub fn build(self) -> Result<RecordSchema<R>, SchemaError> {
        let mut fields = Vec::with_capacity(self.pending.len());
        let mut by_name = HashMap::with_capacity(self.pending.len());

        for (descriptor, get, set) in self.pending {
            let name = descriptor.name.clone();
            if by_name.contains_key(&name) {
                return Err(ConfigError::schema(format!("duplicate field '{name}'")).into());
            }
            let info = compile_field(self.registry, descriptor)
                .map_err(|e| SchemaError::from(e).with_context(format_args!("field '{name}'")))?;
            by_name.insert(name, fields.len());
            fields.push(BoundField { info, get, set });
        }

        tracing::info!(fields = fields.len(), "record schema built");
        Ok(RecordSchema { fields, by_name })
    }
}

/// Compiled schema of record type `R`: one [`FieldInfo`] per field plus the
/// accessors that move values in and out of `R`.
///
/// Immutable after build and safe to share between threads converting
/// different records.
pub struct RecordSchema<R> {
    fields: Vec<BoundField<R>>,
    by_name: HashMap<String, usize>,
}

impl<R> RecordSchema<R> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().map(|f| &f.info)
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.position(name).map(|i| &self.fields[i].info)
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldInfo> {
        self.fields.get(index).map(|f| &f.info)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Read cell `index` of a record into `record`, with the field's cell
    /// policy (trim, default, required) applied.
    ///
    /// An index past the last field reports `TooManyFields`. On any error
    /// the record is left untouched.
    pub fn read_field(
        &self,
        index: usize,
        record: &mut R,
        line: &str,
        line_number: u64,
        cell: &str,
        parse_error: &mut ParseError,
    ) {
        let Some(field) = self.fields.get(index) else {
            parse_error.set(
                ParseErrorKind::TooManyFields,
                format!("cell {} but only {} fields", index + 1, self.fields.len()),
                line,
                line_number,
            );
            return;
        };
        let value = field.info.read_cell(line, line_number, cell, parse_error);
        if !parse_error.is_set() {
            (field.set)(record, value);
        }
    }

    /// Text for field `index` of `record`; `None` for an absent value or an
    /// index past the last field.
    pub fn write_field(&self, index: usize, record: &R) -> Option<String> {
        let field = self.fields.get(index)?;
        let value = (field.get)(record);
        field.info.value_to_text(value.as_ref())
    }

    /// JSON description of the compiled fields, in order.
    pub fn describe(&self) -> serde_json::Value {
        let fields: Vec<serde_json::Value> = self
            .fields()
            .map(|f| {
                serde_json::json!({
                    "name": f.name(),
                    "cell_name": f.cell_name(),
                    "type": f.field_type().to_string(),
                    "converter": f.converter_name(),
                    "required": f.is_required(),
                    "trim_input": f.is_trim_input(),
                    "format": f.format(),
                    "flags": f.flags().bits(),
                    "default": f.default_value(),
                    "needs_quotes": f.needs_quotes(),
                })
            })
            .collect();
        serde_json::json!({ "fields": fields })
    }
}

impl RecordSchema<Row> {
    /// Schema over positional [`Row`]s: field `i` lives in slot `i`.
    pub fn from_descriptors(
        registry: &ConverterRegistry,
        descriptors: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::with_registry(registry);
        for (index, descriptor) in descriptors.into_iter().enumerate() {
            builder = builder.field(
                descriptor,
                move |row: &Row| row.get(index).cloned(),
                move |row: &mut Row, value| row.set(index, value),
            );
        }
        builder.build()
    }

    /// An empty row with one slot per field.
    pub fn new_row(&self) -> Row {
        Row::with_len(self.len())
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields()).finish()
    }
}
