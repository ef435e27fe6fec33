use crate::kind::Kind;

/// Errors raised while building dtypes or running element primitives.
#[derive(Debug, thiserror::Error)]
pub enum DTypeError {
    /// No capability is registered for the kind tag.
    #[error("no element kind registered for {0:?}")]
    UnknownKind(Kind),

    /// The scalar cannot be stored into an element of this kind.
    #[error("cannot store a {found} value into a {expected} element")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The scalar does not fit the element's integer range.
    #[error("value out of range for a {itemsize}-byte {kind} element")]
    Overflow { kind: &'static str, itemsize: usize },

    /// The element byte size is not supported by the kind.
    #[error("unsupported itemsize {itemsize} for {kind}")]
    InvalidItemsize { kind: &'static str, itemsize: usize },

    /// Two fields share a name or title.
    #[error("duplicate field name or title: {0}")]
    DuplicateField(String),

    /// A field reaches past the end of its record.
    #[error("field '{name}' at offset {offset} overruns a record of {itemsize} bytes")]
    FieldOutOfBounds {
        name: String,
        offset: usize,
        itemsize: usize,
    },

    /// The text does not fit the element's declared width.
    #[error("text of {len} units does not fit a width-{width} element")]
    TextTooLong { width: usize, len: usize },

    /// A record value carries the wrong number of field values.
    #[error("record value has {found} fields, dtype has {expected}")]
    FieldCountMismatch { expected: usize, found: usize },
}

/// Result type for dtype operations.
pub type Result<T> = std::result::Result<T, DTypeError>;
