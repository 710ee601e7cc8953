use std::fmt;

use serde::Serialize;

/// Kind of a data-time conversion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Cell text is not a valid representation of the field's type.
    InvalidFormat,
    /// Cell text is longer than the field can hold.
    TruncatedValue,
    /// Required field has an empty cell and no default.
    RequiredButMissing,
    /// Record has fewer cells than the schema has fields.
    TooFewFields,
    /// Record has more cells than the schema has fields.
    TooManyFields,
    /// Driver or converter bug (e.g. mismatched configuration).
    InternalError,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidFormat => f.write_str("invalid format"),
            ParseErrorKind::TruncatedValue => f.write_str("truncated value"),
            ParseErrorKind::RequiredButMissing => f.write_str("required but missing"),
            ParseErrorKind::TooFewFields => f.write_str("too few fields"),
            ParseErrorKind::TooManyFields => f.write_str("too many fields"),
            ParseErrorKind::InternalError => f.write_str("internal error"),
        }
    }
}

/// Error-capture out-parameter for one read-path conversion attempt.
///
/// Starts UNSET. A converter sets it at most once per attempt and never
/// resets it; the first error recorded is kept. Callers that reuse one
/// instance across attempts must call [`ParseError::reset`] in between.
///
/// Single-owner: drivers converting records in parallel keep one instance
/// per in-flight conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseError {
    kind: Option<ParseErrorKind>,
    message: String,
    line_number: u64,
    line: String,
}

impl ParseError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to UNSET, keeping the allocated buffers.
    pub fn reset(&mut self) {
        self.kind = None;
        self.message.clear();
        self.line_number = 0;
        self.line.clear();
    }

    pub fn is_set(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<ParseErrorKind> {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Record the error for this attempt.
    ///
    /// Ignored (with a warning) when the instance is already set.
    pub fn set(&mut self, kind: ParseErrorKind, message: impl Into<String>, line: &str, line_number: u64) {
        if let Some(existing) = self.kind {
            tracing::warn!(
                existing = %existing,
                ignored = %kind,
                line_number,
                "parse error already set for this attempt, keeping the first one"
            );
            return;
        }
        self.kind = Some(kind);
        self.message = message.into();
        self.line.clear();
        self.line.push_str(line);
        self.line_number = line_number;
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            None => f.write_str("no error"),
            Some(kind) => write!(
                f,
                "line {}: {kind}: {} (line: {:?})",
                self.line_number, self.message, self.line
            ),
        }
    }
}
