//! Comparison engine entry points.

use strided_array::Array;
use strided_dtype::Kind;

use crate::dispatch::{BinaryDispatcher, ElementwiseDispatcher};
use crate::operand::coerce;
use crate::{record, text};
use crate::{CompareError, CompareOp, CompareOptions, Operand, Result};

/// Outcome of a rich comparison.
#[derive(Debug, Clone)]
pub enum Comparison {
    /// Fresh boolean array over the broadcast shape.
    Array(Array),
    /// Scalar answer, only produced against the absent value.
    Bool(bool),
    /// The operands are not comparable; callers may fall back to identity
    /// semantics.
    NotImplemented,
}

impl Comparison {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Comparison::NotImplemented)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Comparison::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Array> {
        match self {
            Comparison::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<Option<Array>> for Comparison {
    fn from(result: Option<Array>) -> Self {
        result.map_or(Comparison::NotImplemented, Comparison::Array)
    }
}

/// Rich comparison engine.
#[derive(Debug)]
pub struct Comparator {
    options: CompareOptions,
    dispatcher: Box<dyn BinaryDispatcher>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self::with_dispatcher(options, Box::new(ElementwiseDispatcher))
    }

    pub fn with_dispatcher(options: CompareOptions, dispatcher: Box<dyn BinaryDispatcher>) -> Self {
        Self {
            options,
            dispatcher,
        }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare `lhs` against `other` with `op`.
    ///
    /// `==` and `!=` against [`Operand::None`] answer a scalar without
    /// broadcasting. Other operands are coerced to arrays first; an operand
    /// without an array form is [`Comparison::NotImplemented`].
    pub fn compare(&self, lhs: &Array, other: impl Into<Operand>, op: CompareOp) -> Result<Comparison> {
        let other = other.into();
        if let Operand::None = other {
            return Ok(match op {
                CompareOp::Eq => Comparison::Bool(false),
                CompareOp::Ne => Comparison::Bool(true),
                _ => Comparison::NotImplemented,
            });
        }
        let Some(rhs) = coerce(&other, lhs)? else {
            tracing::debug!(lhs = %lhs.dtype(), "operand cannot be coerced to an array");
            return Ok(Comparison::NotImplemented);
        };
        Ok(self.compare_pair(lhs, &rhs, op)?.into())
    }

    /// Compare two arrays with `op`.
    pub fn compare_arrays(&self, lhs: &Array, rhs: &Array, op: CompareOp) -> Result<Comparison> {
        Ok(self.compare_pair(lhs, rhs, op)?.into())
    }

    /// Dispatcher first, then record or opaque-bytes comparison for equal
    /// structured dtypes, then text comparison.
    pub(crate) fn compare_pair(&self, lhs: &Array, rhs: &Array, op: CompareOp) -> Result<Option<Array>> {
        let (lk, rk) = (lhs.dtype().kind(), rhs.dtype().kind());
        if (lk.is_structured() || rk.is_structured()) && !op.is_equality() {
            return Err(CompareError::UnsupportedComparison(op));
        }
        if let Some(out) = self.dispatcher.dispatch(lhs, rhs, op, &self.options)? {
            return Ok(Some(out));
        }

        if lk.is_structured() {
            if lhs.dtype() != rhs.dtype() {
                tracing::debug!(lhs = %lhs.dtype(), rhs = %rhs.dtype(), "structured dtypes differ");
                return Ok(None);
            }
            return match lk {
                Kind::Record => record::compare_records(self, lhs, rhs, op),
                _ => text::compare_text(lhs, rhs, op, false, &self.options),
            };
        }
        if lk == Kind::Object {
            return Ok(None);
        }
        if lk.is_text() && rk.is_text() {
            return text::compare_text(lhs, rhs, op, self.options.rstrip, &self.options);
        }
        tracing::debug!(lhs = %lhs.dtype(), rhs = %rhs.dtype(), %op, "no comparison for dtypes");
        Ok(None)
    }
}

/// Compare with a default [`Comparator`].
pub fn compare(lhs: &Array, other: impl Into<Operand>, op: CompareOp) -> Result<Comparison> {
    Comparator::default().compare(lhs, other, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strided_array::MemoryOrder;
    use strided_dtype::{DType, Scalar};

    #[test]
    fn test_absent_value_short_circuits() {
        let a = Array::zeros(DType::int64(), &[3], MemoryOrder::C).unwrap();
        assert_eq!(compare(&a, Operand::None, CompareOp::Eq).unwrap().as_bool(), Some(false));
        assert_eq!(compare(&a, Scalar::None, CompareOp::Ne).unwrap().as_bool(), Some(true));
        assert!(compare(&a, Operand::None, CompareOp::Lt)
            .unwrap()
            .is_not_implemented());
    }

    #[test]
    fn test_uncoercible_operand_is_not_implemented() {
        let a = Array::zeros(DType::int64(), &[2], MemoryOrder::C).unwrap();
        let other = Operand::List(vec![Scalar::Int(1), Scalar::from("x")]);
        assert!(compare(&a, other, CompareOp::Eq).unwrap().is_not_implemented());
    }

    #[test]
    fn test_number_against_text_is_not_implemented() {
        let a = Array::zeros(DType::int64(), &[2], MemoryOrder::C).unwrap();
        assert!(compare(&a, Scalar::from("x"), CompareOp::Eq)
            .unwrap()
            .is_not_implemented());
    }

    #[test]
    fn test_scalar_operand_broadcasts() {
        let values: Vec<Scalar> = (0..4).map(Scalar::Int).collect();
        let a = Array::from_scalars(DType::int64(), &[4], &values).unwrap();
        let out = compare(&a, Scalar::Float(1.5), CompareOp::Gt)
            .unwrap()
            .into_array()
            .unwrap();
        assert_eq!(out.shape(), vec![4]);
        assert!(out.owns_data());
        assert!(out.base().is_none());
        let got: Vec<Scalar> = out.to_scalars().unwrap();
        let expected: Vec<Scalar> = [false, false, true, true].into_iter().map(Scalar::Bool).collect();
        assert_eq!(got, expected);
    }
}
