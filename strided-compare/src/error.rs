use strided_array::ArrayError;
use strided_dtype::DTypeError;

use crate::CompareOp;

/// Errors raised by the comparison engine.
///
/// An operand pair the engine cannot handle is not an error: it is the
/// [`Comparison::NotImplemented`](crate::Comparison::NotImplemented) outcome.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// The operand kinds cannot be compared this way.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Only equality comparisons are defined on structured dtypes.
    #[error("structured arrays only support == and !=, not {0}")]
    UnsupportedComparison(CompareOp),

    /// A record dtype without any comparable field.
    #[error("no fields found in record dtype")]
    NoFieldsFound,

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error(transparent)]
    DType(#[from] DTypeError),
}

/// Result type for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;
