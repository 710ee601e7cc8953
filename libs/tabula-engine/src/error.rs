use tabula_api::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("converter configuration error: {0}")]
    Converter(#[from] ConfigError),

    #[error("schema config error: {0}")]
    Config(String),

    #[error("converter registry already installed")]
    RegistryInstalled,
}

impl SchemaError {
    /// Add context to the error.
    ///
    /// For `Converter` variant, context is added to the inner `ConfigError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            SchemaError::Converter(e) => SchemaError::Converter(e.with_context(ctx)),
            SchemaError::Config(msg) => SchemaError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
