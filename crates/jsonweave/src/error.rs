use thiserror::Error;

/// Errors produced while decoding JSON input.
///
/// The first grammar violation aborts the decode; no partial value is
/// returned. [`NumericValueOutOfRange`] is deliberately distinct from
/// [`InvalidNumber`] so callers can tell "not JSON" apart from "valid JSON I
/// cannot represent as an `f64`".
///
/// [`NumericValueOutOfRange`]: ParseError::NumericValueOutOfRange
/// [`InvalidNumber`]: ParseError::InvalidNumber
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A byte that cannot start or continue the expected production.
    #[error("unexpected token")]
    UnexpectedToken,
    /// Input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A number literal violating the strict JSON number grammar.
    #[error("invalid number")]
    InvalidNumber,
    /// An unterminated string, a bad escape, or a raw control byte.
    #[error("invalid string")]
    InvalidString,
    /// A `\u` escape not followed by exactly four hex digits.
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,
    /// A syntactically valid number whose magnitude overflows `f64`.
    #[error("numeric value out of range")]
    NumericValueOutOfRange,
    /// Nesting deeper than [`ScannerOptions::max_depth`].
    ///
    /// [`ScannerOptions::max_depth`]: crate::ScannerOptions::max_depth
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,
}

/// Errors produced while encoding a value to JSON text.
///
/// Inside a [`Decorator`] the first error latches: every later emission call
/// becomes a no-op, and whatever text was already written must be discarded.
///
/// [`Decorator`]: crate::Decorator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    /// NaN or an infinity, which have no JSON representation.
    #[error("unsupported float value: {0}")]
    NonFiniteFloat(f64),
    /// A value with no JSON form, naming the concrete type.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),
    /// The output sink refused a write.
    #[error("output sink failure")]
    Sink(#[from] core::fmt::Error),
    /// An error raised by a user-supplied marshaling capability.
    #[error("{0}")]
    Custom(String),
}

impl EncodeError {
    /// Builds a [`EncodeError::Custom`] from any message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}
