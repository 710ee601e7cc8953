use std::fmt;

/// Category of a configuration error.
///
/// Every variant is schema-time: none of them can occur while converting
/// the cells of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Declared field type is structurally incompatible with the converter.
    IncompatibleType,
    /// Format string or flags do not describe a valid configuration.
    InvalidFormat,
    /// No converter is registered for the declared type or key.
    NoConverter,
    /// An explicit converter override could not be constructed.
    Construction,
    /// Schema-level problem (duplicate field, malformed descriptor).
    Schema,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::IncompatibleType => f.write_str("incompatible type"),
            ErrorKind::InvalidFormat => f.write_str("invalid format"),
            ErrorKind::NoConverter => f.write_str("no converter"),
            ErrorKind::Construction => f.write_str("construction"),
            ErrorKind::Schema => f.write_str("schema"),
        }
    }
}

/// Configuration error, returned while binding a field to its converter.
///
/// Fatal to building the record schema that contains the field.
#[derive(Clone)]
pub struct ConfigError {
    kind: ErrorKind,
    message: String,
}

impl ConfigError {
    pub fn incompatible_type(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::IncompatibleType, message: msg.into() }
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidFormat, message: msg.into() }
    }

    pub fn no_converter(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NoConverter, message: msg.into() }
    }

    pub fn construction(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Construction, message: msg.into() }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Schema, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}
