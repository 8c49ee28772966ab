//! Error types for record marshaling

use thiserror::Error;

/// Result type for rowbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error coming from a row reader or row writer
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by layout derivation, decoding and encoding
#[derive(Debug, Error)]
pub enum Error {
    /// A field's declared type has no registered codec
    #[error("No codec for type {type_name} (field '{field}' of {record})")]
    UnsupportedType {
        /// Record type being derived
        record: &'static str,
        /// Qualified field name
        field: String,
        /// Declared field type
        type_name: &'static str,
    },

    /// A temporal field was declared without a format
    #[error("Temporal field '{field}' of {record} has no format")]
    MissingFormat {
        /// Record type being derived
        record: &'static str,
        /// Qualified field name
        field: String,
    },

    /// A temporal field carries a format chrono cannot interpret
    #[error("Temporal field '{field}' of {record} has invalid format: {format}")]
    InvalidFormat {
        /// Record type being derived
        record: &'static str,
        /// Qualified field name
        field: String,
        /// Offending format string
        format: String,
    },

    /// The row reader has no more rows
    #[error("End of input")]
    EndOfInput,

    /// The row reader failed
    #[error("Row read failed: {0}")]
    Read(#[source] BoxError),

    /// A field could not be decoded from its column
    #[error("Field {field} parse failed (row:{row}): {source}")]
    Decode {
        /// Qualified field name
        field: String,
        /// 1-based count of rows consumed so far
        row: u64,
        /// Underlying conversion failure
        #[source]
        source: ConversionError,
    },

    /// A field could not be encoded into its column
    #[error("Field {field} encode failed: {source}")]
    Encode {
        /// Qualified field name
        field: String,
        /// Underlying conversion failure
        #[source]
        source: ConversionError,
    },

    /// The row writer failed
    #[error("Row write failed: {0}")]
    Write(#[source] BoxError),

    /// Invalid codec configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Check whether this error only signals that the input is exhausted
    #[must_use]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }

    /// Get the conversion failure behind a decode or encode error
    #[must_use]
    pub fn conversion(&self) -> Option<&ConversionError> {
        match self {
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure converting a single cell to or from a field value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Text is not a base-10 integer
    #[error("Invalid integer: {raw:?}")]
    InvalidInteger {
        /// Raw cell text
        raw: String,
    },

    /// Number does not fit the field's width
    #[error("Value {raw:?} overflows {type_name}")]
    Overflow {
        /// Raw cell text
        raw: String,
        /// Declared numeric type
        type_name: &'static str,
    },

    /// Text is not a floating point number
    #[error("Invalid float: {raw:?}")]
    InvalidFloat {
        /// Raw cell text
        raw: String,
    },

    /// Text does not match the temporal format
    #[error("Invalid time {raw:?} for format {format:?}: {reason}")]
    InvalidTime {
        /// Raw cell text
        raw: String,
        /// Format the text was parsed with
        format: String,
        /// Parser message
        reason: String,
    },

    /// Local time does not exist or is ambiguous in the configured zone
    #[error("Local time {raw:?} cannot be placed in zone {zone}")]
    NonexistentLocalTime {
        /// Raw cell text
        raw: String,
        /// Configured zone offset
        zone: String,
    },

    /// Value cannot be rendered with the temporal format
    #[error("Cannot format time with {format:?}")]
    TimeFormat {
        /// Offending format string
        format: String,
    },

    /// Field slot does not hold the type its codec expects
    #[error("Field slot is not a {expected}")]
    TypeMismatch {
        /// Type the codec was resolved for
        expected: &'static str,
    },

    /// Failure reported by a custom hook
    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// Create a custom conversion error, typically from a hook
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
