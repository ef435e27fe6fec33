//! Element-type descriptors shared by the strided array crates.
//!
//! This crate holds everything the array layer needs to know about an
//! element without knowing its bit layout:
//!
//! - [`DType`]: fixed element byte size, [`Kind`] tag, and for records an
//!   ordered [`FieldTable`] of `(name, sub-dtype, byte offset)` entries
//! - [`Scalar`]: the value currency passed to and from element primitives
//! - [`ElementKind`]: the per-kind capability interface
//!   (`get_value` / `set_value` / `compare_raw` plus reference handling)
//! - [`KindRegistry`]: maps kind tags to capabilities and composes record and
//!   sub-array dtypes out of their fields
//!
//! External crates can register their own kinds under [`Kind::User`] without
//! touching the array or comparison layers.

pub mod dtype;
pub mod element_kind;
pub mod error;
pub mod kind;
pub mod registry;
pub mod scalar;

pub use dtype::{DType, Field, FieldTable, SubArray};
pub use element_kind::{
    BoolKind, BytesKind, ComplexKind, ElementKind, FloatKind, IntKind, ObjectKind, UIntKind,
    UnicodeKind, VoidKind,
};
pub use error::{DTypeError, Result};
pub use kind::Kind;
pub use registry::KindRegistry;
pub use scalar::Scalar;
