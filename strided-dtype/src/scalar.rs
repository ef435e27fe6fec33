//! Scalar values passed to and from element primitives.

use std::cmp::Ordering;
use std::sync::Arc;

use num_complex::Complex64;

use crate::DType;

/// A single element value, independent of its storage layout.
///
/// `Scalar::None` is the absent-value sentinel. Record values hold one scalar
/// per canonical field in declaration order; sub-array values are flattened
/// row-major into the same `Record` sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex64),
    Bytes(Vec<u8>),
    Text(String),
    Record(Vec<Scalar>),
    Object(Arc<Scalar>),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::None => "none",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::UInt(_) => "uint",
            Scalar::Float(_) => "float",
            Scalar::Complex(_) => "complex",
            Scalar::Bytes(_) => "bytes",
            Scalar::Text(_) => "text",
            Scalar::Record(_) => "record",
            Scalar::Object(_) => "object",
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Scalar::None)
    }

    /// Strip any number of `Object` wrappers.
    pub fn unwrap_object(&self) -> &Scalar {
        let mut current = self;
        while let Scalar::Object(inner) = current {
            current = inner;
        }
        current
    }

    /// Truth value used when a scalar is stored into a bool element.
    pub fn truthiness(&self) -> Option<bool> {
        match self.unwrap_object() {
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(v) => Some(*v != 0),
            Scalar::UInt(v) => Some(*v != 0),
            Scalar::Float(v) => Some(*v != 0.0),
            Scalar::Complex(c) => Some(c.re != 0.0 || c.im != 0.0),
            _ => None,
        }
    }

    /// Compare two values across numeric representations.
    ///
    /// Returns `None` for unordered pairs: NaN operands, mismatched
    /// categories, or records whose first differing field is unordered.
    pub fn partial_cmp_value(&self, other: &Scalar) -> Option<Ordering> {
        use Scalar::*;
        let (a, b) = (self.unwrap_object(), other.unwrap_object());
        match (a, b) {
            (None, None) => Some(Ordering::Equal),
            (Bytes(x), Bytes(y)) => Some(x.cmp(y)),
            (Text(x), Text(y)) => Some(x.cmp(y)),
            (Record(x), Record(y)) => {
                if x.len() != y.len() {
                    return Option::None;
                }
                for (l, r) in x.iter().zip(y) {
                    match l.partial_cmp_value(r)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(Ordering::Equal)
            }
            (Complex(_), _) | (_, Complex(_)) => {
                let x = a.as_complex()?;
                let y = b.as_complex()?;
                match x.re.partial_cmp(&y.re)? {
                    Ordering::Equal => x.im.partial_cmp(&y.im),
                    ord => Some(ord),
                }
            }
            (Float(_), _) | (_, Float(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            _ => Some(a.as_i128()?.cmp(&b.as_i128()?)),
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Scalar::Bool(b) => Some(*b as i128),
            Scalar::Int(v) => Some(*v as i128),
            Scalar::UInt(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Real numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self.unwrap_object() {
            Scalar::Float(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Numeric value widened to a complex number.
    pub fn as_complex(&self) -> Option<Complex64> {
        match self.unwrap_object() {
            Scalar::Complex(c) => Some(*c),
            other => other.as_f64().map(|re| Complex64::new(re, 0.0)),
        }
    }

    /// Smallest builtin dtype able to hold this value.
    ///
    /// Records have no inferable layout and yield `None`.
    pub fn infer_dtype(&self) -> Option<DType> {
        match self {
            Scalar::None | Scalar::Object(_) => Some(DType::object()),
            Scalar::Bool(_) => Some(DType::bool()),
            Scalar::Int(_) => Some(DType::int64()),
            Scalar::UInt(_) => Some(DType::uint64()),
            Scalar::Float(_) => Some(DType::float64()),
            Scalar::Complex(_) => Some(DType::complex128()),
            Scalar::Bytes(b) => DType::bytes(b.len().max(1)).ok(),
            Scalar::Text(s) => DType::unicode(s.chars().count().max(1)).ok(),
            Scalar::Record(_) => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::UInt(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Self {
        Scalar::Complex(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<&[u8]> for Scalar {
    fn from(v: &[u8]) -> Self {
        Scalar::Bytes(v.to_vec())
    }
}
