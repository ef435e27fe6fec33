//! Right-hand operands and their coercion to arrays.

use strided_array::{Array, ArrayError, MemoryOrder};
use strided_dtype::{DType, Kind, Scalar};

use crate::Result;

/// Right-hand side of a comparison.
#[derive(Debug, Clone)]
pub enum Operand {
    /// The absent-value sentinel.
    None,
    Array(Array),
    /// A single value, compared as a 0-d array.
    Scalar(Scalar),
    /// A flat sequence of values, compared as a 1-d array.
    List(Vec<Scalar>),
}

impl From<Array> for Operand {
    fn from(a: Array) -> Self {
        Operand::Array(a)
    }
}

impl From<&Array> for Operand {
    fn from(a: &Array) -> Self {
        Operand::Array(a.clone())
    }
}

impl From<Scalar> for Operand {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::None => Operand::None,
            s => Operand::Scalar(s),
        }
    }
}

impl From<Vec<Scalar>> for Operand {
    fn from(items: Vec<Scalar>) -> Self {
        Operand::List(items)
    }
}

fn numeric_rank(kind: Kind) -> Option<u8> {
    match kind {
        Kind::Bool => Some(0),
        Kind::Int | Kind::UInt => Some(1),
        Kind::Float => Some(2),
        Kind::Complex => Some(3),
        _ => None,
    }
}

/// Common dtype for a list of values, `None` when they have none.
///
/// Numbers widen along bool < int < float < complex, with mixed signed and
/// unsigned integers going to float. Text widens to the longest item and to
/// code points when any item is code-point text. Anything holding a generic
/// reference makes the whole list generic.
pub(crate) fn unify(items: &[Scalar]) -> Option<DType> {
    let dtypes = items
        .iter()
        .map(Scalar::infer_dtype)
        .collect::<Option<Vec<DType>>>()?;
    let Some(first) = dtypes.first() else {
        return Some(DType::float64());
    };
    if dtypes.iter().any(|d| d.kind() == Kind::Object) {
        return Some(DType::object());
    }

    if dtypes.iter().all(|d| d.is_text()) {
        let width = dtypes.iter().filter_map(DType::text_width).max().unwrap_or(1);
        return if dtypes.iter().any(|d| d.kind() == Kind::Unicode) {
            DType::unicode(width).ok()
        } else {
            DType::bytes(width).ok()
        };
    }

    let ranks = dtypes
        .iter()
        .map(|d| numeric_rank(d.kind()))
        .collect::<Option<Vec<u8>>>()?;
    let signed = dtypes.iter().any(|d| d.kind() == Kind::Int);
    let unsigned = dtypes.iter().any(|d| d.kind() == Kind::UInt);
    match ranks.iter().copied().max().unwrap_or(0) {
        0 => Some(DType::bool()),
        1 if signed && unsigned => Some(DType::float64()),
        1 => Some(first_integer(&dtypes).unwrap_or_else(|| first.clone())),
        2 => Some(DType::float64()),
        _ => Some(DType::complex128()),
    }
}

fn first_integer(dtypes: &[DType]) -> Option<DType> {
    dtypes
        .iter()
        .find(|d| matches!(d.kind(), Kind::Int | Kind::UInt))
        .cloned()
}

/// Fill a fresh array of `dtype`, answering `None` when a value does not fit.
fn filled(like: &Array, dtype: DType, shape: &[usize], items: &[Scalar]) -> Result<Option<Array>> {
    let out = Array::zeros_in(like.config(), dtype, shape, MemoryOrder::C)?;
    let stored = if shape.is_empty() {
        items.first().map_or(Ok(()), |item| out.assign_scalar(item))
    } else {
        items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| out.set(&[i], item))
    };
    match stored {
        Ok(()) => Ok(Some(out)),
        Err(ArrayError::DType(err)) => {
            tracing::debug!(%err, "operand value does not fit the coerced dtype");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Coerce `operand` to an array comparable with `like`.
///
/// `Ok(None)` means the operand has no array form; allocation failures are
/// still errors.
pub(crate) fn coerce(operand: &Operand, like: &Array) -> Result<Option<Array>> {
    let generic = like.dtype().kind() == Kind::Object;
    match operand {
        Operand::Array(a) => Ok(Some(a.clone())),
        Operand::None => filled(like, DType::object(), &[], &[Scalar::None]),
        Operand::Scalar(s) => {
            let dtype = if generic {
                Some(DType::object())
            } else if matches!(s, Scalar::Record(_)) && like.dtype().has_fields() {
                Some(like.dtype().clone())
            } else {
                s.infer_dtype()
            };
            match dtype {
                Some(dtype) => filled(like, dtype, &[], std::slice::from_ref(s)),
                None => Ok(None),
            }
        }
        Operand::List(items) => {
            let records = !items.is_empty() && items.iter().all(|s| matches!(s, Scalar::Record(_)));
            let dtype = if generic {
                Some(DType::object())
            } else if records && like.dtype().has_fields() {
                Some(like.dtype().clone())
            } else {
                unify(items)
            };
            match dtype {
                Some(dtype) => filled(like, dtype, &[items.len()], items),
                None => Ok(None),
            }
        }
    }
}
