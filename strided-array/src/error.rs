use strided_dtype::DTypeError;

/// Errors raised by array construction, ownership and iteration.
#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    /// Bad shape, stride or buffer-size combination.
    #[error("{0}")]
    Construction(String),

    /// The array base can only be set once.
    #[error("array base is already set")]
    AlreadyBound,

    #[error("invalid base: {0}")]
    InvalidBase(&'static str),

    /// The base chain resolves back to the array itself.
    #[error("cannot set the array base to itself or to a chain resolving to it")]
    CircularBase,

    #[error("shapes {0:?} and {1:?} cannot be broadcast together")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    #[error("failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("expected {expected} indices, got {found}")]
    RankMismatch { expected: usize, found: usize },

    #[error("index {index} is out of bounds for axis {axis} with size {size}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        size: usize,
    },

    #[error("array is read-only")]
    NotWriteable,

    #[error("no field named '{0}'")]
    NoSuchField(String),

    /// A mask operation was requested on an array without one, or masked
    /// values would be lost by copying into an unmasked destination.
    #[error("array has no validity mask")]
    MaskNotPresent,

    #[error(transparent)]
    DType(#[from] DTypeError),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, ArrayError>;
