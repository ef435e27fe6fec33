//! Binary dispatch seam for elementwise comparison.

use std::fmt;

use strided_array::Array;
use strided_dtype::{DTypeError, Kind};

use crate::output::compare_pairs;
use crate::{CompareOp, CompareOptions, Result};

/// Elementwise comparison over a registered family of element kinds.
///
/// Answers `Ok(None)` for pairs it does not handle, which lets the engine
/// fall back to record or text comparison.
pub trait BinaryDispatcher: fmt::Debug {
    fn dispatch(
        &self,
        lhs: &Array,
        rhs: &Array,
        op: CompareOp,
        options: &CompareOptions,
    ) -> Result<Option<Array>>;
}

/// Default dispatcher: bool, numeric, complex, generic-reference and user
/// kinds, through the registry's `compare_raw` for equal dtypes and decoded
/// values otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementwiseDispatcher;

impl ElementwiseDispatcher {
    pub fn handles(lhs: Kind, rhs: Kind) -> bool {
        let general = |k: Kind| k.is_numeric() || matches!(k, Kind::Object | Kind::User(_));
        lhs == Kind::Object || rhs == Kind::Object || (general(lhs) && general(rhs))
    }
}

impl BinaryDispatcher for ElementwiseDispatcher {
    fn dispatch(
        &self,
        lhs: &Array,
        rhs: &Array,
        op: CompareOp,
        options: &CompareOptions,
    ) -> Result<Option<Array>> {
        let (ld, rd) = (lhs.dtype(), rhs.dtype());
        if !Self::handles(ld.kind(), rd.kind()) {
            return Ok(None);
        }
        let registry = lhs.registry();
        for kind in [ld.kind(), rd.kind()] {
            if !registry.contains(kind) {
                return Err(DTypeError::UnknownKind(kind).into());
            }
        }

        let same = ld == rd;
        let (ln, rn) = (ld.itemsize(), rd.itemsize());
        let out = compare_pairs(lhs, rhs, options.mask_policy, |a, b| {
            let a = unsafe { std::slice::from_raw_parts(a, ln) };
            let b = unsafe { std::slice::from_raw_parts(b, rn) };
            let ord = if same {
                registry.compare_raw(ld, a, b)
            } else {
                registry
                    .get_value(ld, a)?
                    .partial_cmp_value(&registry.get_value(rd, b)?)
            };
            Ok(op.apply_opt(ord))
        })?;
        Ok(Some(out))
    }
}
