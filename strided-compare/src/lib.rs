//! Broadcasting rich comparison over strided arrays.
//!
//! [`Comparator::compare`] coerces the right-hand [`Operand`] to an array and
//! produces a fresh boolean array over the broadcast shape. Numeric, generic
//! reference and user kinds go through a [`BinaryDispatcher`]; pairs it does
//! not handle fall back to:
//!
//! - record comparison, field by field, for `==` and `!=` only
//! - fixed-width text comparison with NUL-padding equivalence and an optional
//!   trailing-whitespace strip
//!
//! Validity masks propagate into the result under [`MaskPolicy::Propagate`].
//!
//! # Example
//!
//! ```
//! use strided_array::Array;
//! use strided_compare::{compare, CompareOp};
//! use strided_dtype::{DType, Scalar};
//!
//! let ints = |v: &[i64]| v.iter().map(|&x| Scalar::Int(x)).collect::<Vec<_>>();
//! let col = Array::from_scalars(DType::int64(), &[3, 1], &ints(&[1, 2, 3])).unwrap();
//! let row = Array::from_scalars(DType::int64(), &[1, 2], &ints(&[2, 3])).unwrap();
//! let out = compare(&col, &row, CompareOp::Lt).unwrap().into_array().unwrap();
//! assert_eq!(out.shape(), vec![3, 2]);
//! assert_eq!(out.get(&[0, 0]).unwrap(), Scalar::Bool(true));
//! assert_eq!(out.get(&[2, 1]).unwrap(), Scalar::Bool(false));
//! ```

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod op;
pub mod operand;
pub mod options;
mod output;
mod record;
pub mod text;

pub use dispatch::{BinaryDispatcher, ElementwiseDispatcher};
pub use engine::{compare, Comparator, Comparison};
pub use error::{CompareError, Result};
pub use op::CompareOp;
pub use operand::Operand;
pub use options::{CompareOptions, MaskPolicy, TextPolicy};
pub use text::{compare_padded, compare_strings};
