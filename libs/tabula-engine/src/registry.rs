use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use converter_boolean::BooleanConverter;
use converter_date::DateConverter;
use converter_enum::EnumConverter;
use converter_number::NumberConverter;
use converter_string::StringConverter;
use tabula_api::{ConfigError, ConverterFactory, DynConverter, FieldType, TypeTag};

use crate::error::SchemaError;

/// Maps declared types and explicit keys to converter constructors.
///
/// Populated before any schema is built and only read afterwards.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    by_type: HashMap<TypeTag, ConverterFactory>,
    by_key: HashMap<String, ConverterFactory>,
}

impl ConverterRegistry {
    /// Empty registry. Every field then needs an explicit factory override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in converter families.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            "string",
            StringConverter::factory,
            &[TypeTag::String, TypeTag::Char],
        );
        registry.register(
            "number",
            NumberConverter::factory,
            &[
                TypeTag::Int32,
                TypeTag::Int64,
                TypeTag::UInt64,
                TypeTag::Float32,
                TypeTag::Float64,
            ],
        );
        registry.register("boolean", BooleanConverter::factory, &[TypeTag::Bool]);
        registry.register("date", DateConverter::factory, &[TypeTag::Date, TypeTag::DateTime]);
        registry.register("enum", EnumConverter::factory, &[TypeTag::Enum]);
        registry
    }

    /// Register `factory` under `key` and as default for each of `tags`.
    pub fn register(&mut self, key: impl Into<String>, factory: ConverterFactory, tags: &[TypeTag]) {
        self.register_key(key, factory);
        for tag in tags {
            self.register_type(*tag, factory);
        }
    }

    /// Set the default converter for a declared type. Replaces any previous one.
    pub fn register_type(&mut self, tag: TypeTag, factory: ConverterFactory) {
        if self.by_type.insert(tag, factory).is_some() {
            tracing::debug!(type_tag = %tag, "replaced default converter");
        }
    }

    pub fn register_key(&mut self, key: impl Into<String>, factory: ConverterFactory) {
        let key = key.into();
        if self.by_key.insert(key.clone(), factory).is_some() {
            tracing::debug!(key = %key, "replaced keyed converter");
        }
    }

    /// Construct the default converter for `declared`.
    pub fn resolve_default(&self, declared: &FieldType) -> Result<Arc<dyn DynConverter>, ConfigError> {
        let tag = declared.tag();
        let factory = self
            .by_type
            .get(&tag)
            .ok_or_else(|| ConfigError::no_converter(format!("no converter for type {declared}")))?;
        factory().map_err(|e| e.with_context(format_args!("default converter for {tag}")))
    }

    /// Construct the converter registered under `key`.
    pub fn resolve_key(&self, key: &str) -> Result<Arc<dyn DynConverter>, ConfigError> {
        let factory = self
            .by_key
            .get(key)
            .ok_or_else(|| ConfigError::no_converter(format!("no converter registered as '{key}'")))?;
        factory().map_err(|e| e.with_context(format_args!("converter '{key}'")))
    }

    pub fn has_type(&self, tag: TypeTag) -> bool {
        self.by_type.contains_key(&tag)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<ConverterRegistry> = OnceLock::new();

/// Install the process-wide registry.
///
/// Must run before the first [`global`] call; fails once a registry is in
/// place (installed or lazily defaulted).
pub fn install_global(registry: ConverterRegistry) -> Result<(), SchemaError> {
    GLOBAL.set(registry).map_err(|_| SchemaError::RegistryInstalled)?;
    tracing::info!("converter registry installed");
    Ok(())
}

/// The process-wide registry; the built-in defaults if none was installed.
pub fn global() -> &'static ConverterRegistry {
    GLOBAL.get_or_init(ConverterRegistry::with_defaults)
}
