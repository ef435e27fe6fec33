//! Strided array core: layout, ownership, validity masks and broadcasting.
//!
//! This crate provides:
//!
//! - [`Layout`] and free helpers: byte strides, contiguity classification,
//!   per-axis stride bound checks
//! - [`Array`]: a reference-counted handle to an array object that either
//!   owns its data or borrows it from a [`Base`] (another array or a
//!   [`ForeignBuffer`]); view chains collapse onto the memory owner
//! - Deferred write-back copies ([`Array::writeback_copy`]) that push their
//!   contents into the source on destruction
//! - An optional per-element validity mask with independent ownership
//! - [`MultiIter`]: lock-step element pointers over broadcast arrays
//!
//! Allocation, teardown diagnostics and the element-kind registry are
//! injected through [`ArrayConfig`].
//!
//! # Example
//!
//! ```
//! use strided_array::{Array, MemoryOrder};
//! use strided_dtype::{DType, Scalar};
//!
//! let a = Array::zeros(DType::int64(), &[2, 3], MemoryOrder::C).unwrap();
//! let t = a.transpose().unwrap();
//! t.set(&[2, 1], &Scalar::Int(7)).unwrap();
//! assert_eq!(a.get(&[1, 2]).unwrap(), Scalar::Int(7));
//! assert!(t.base().unwrap().as_array().unwrap().ptr_eq(&a));
//! ```

pub mod alloc;
mod array;
pub mod base;
pub mod broadcast;
pub mod config;
mod copy;
pub mod error;
pub mod flags;
pub mod layout;
mod mask;
mod view;

pub use alloc::{Allocator, SystemAllocator};
pub use array::Array;
pub use base::{Base, ForeignBuffer};
pub use broadcast::{broadcast_shapes, MultiIter};
pub use config::{ArrayConfig, CollectingSink, DiagnosticSink, LogSink};
pub use error::{ArrayError, Result};
pub use flags::{ArrayFlags, MemoryOrder};
pub use layout::{check_strides, contiguity, element_strides_aligned, Layout};
