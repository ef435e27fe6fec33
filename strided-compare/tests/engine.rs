use std::cell::Cell;
use std::cmp::Ordering;
use std::sync::Arc;

use approx::assert_relative_eq;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strided_array::{Array, ArrayConfig, ArrayError, MemoryOrder};
use strided_compare::{
    compare, BinaryDispatcher, CompareError, CompareOp, CompareOptions, Comparator, Comparison,
    MaskPolicy, Operand,
};
use strided_dtype::{DType, ElementKind, Kind, KindRegistry, Scalar};

fn ints(values: &[i64], shape: &[usize]) -> Array {
    let values: Vec<Scalar> = values.iter().map(|&v| Scalar::Int(v)).collect();
    Array::from_scalars(DType::int64(), shape, &values).unwrap()
}

fn read(a: &Array) -> Vec<bool> {
    a.to_scalars()
        .unwrap()
        .into_iter()
        .map(|s| match s {
            Scalar::Bool(b) => b,
            other => panic!("unexpected {other:?}"),
        })
        .collect()
}

fn result(c: Comparison) -> Vec<bool> {
    read(&c.into_array().expect("array result"))
}

// ============================================================================
// Broadcasting
// ============================================================================

#[test]
fn test_broadcast_result_shape() {
    let a = ints(&[0, 1, 2], &[3, 1]);
    let b = ints(&[0, 1, 2, 3], &[1, 4]);
    let out = compare(&a, &b, CompareOp::Ge).unwrap().into_array().unwrap();
    assert_eq!(out.shape(), vec![3, 4]);
    assert!(out.is_c_contiguous());
    assert!(out.owns_data());
    assert_eq!(
        read(&out),
        vec![
            true, false, false, false, //
            true, true, false, false, //
            true, true, true, false,
        ]
    );
}

#[test]
fn test_incompatible_shapes() {
    let a = ints(&[0; 6], &[3, 2]);
    let b = ints(&[0; 4], &[1, 4]);
    assert!(matches!(
        compare(&a, &b, CompareOp::Eq),
        Err(CompareError::Array(ArrayError::ShapeMismatch(_, _)))
    ));
}

#[test]
fn test_self_comparison_is_all_true() {
    let a = ints(&[5, 1, 4, 1, 5, 9], &[2, 3]);
    let t = a.transpose().unwrap();
    for op in [CompareOp::Eq, CompareOp::Le, CompareOp::Ge] {
        let out = compare(&t, &t, op).unwrap().into_array().unwrap();
        assert_eq!(out.shape(), vec![3, 2]);
        assert!(read(&out).into_iter().all(|b| b));
    }
}

#[test]
fn test_randomized_broadcast_matches_pointwise() {
    let mut rng = StdRng::seed_from_u64(0xc0ffee);
    for _ in 0..100 {
        let ndim = rng.gen_range(1..=3);
        let full: Vec<usize> = (0..ndim).map(|_| rng.gen_range(1..=4)).collect();
        let mut stretch = |s: &[usize]| -> Vec<usize> {
            s.iter().map(|&d| if rng.gen_bool(0.4) { 1 } else { d }).collect()
        };
        let (sa, sb) = (stretch(&full), stretch(&full));
        let na: usize = sa.iter().product();
        let nb: usize = sb.iter().product();
        let va: Vec<i64> = (0..na).map(|_| rng.gen_range(0..3)).collect();
        let vb: Vec<i64> = (0..nb).map(|_| rng.gen_range(0..3)).collect();
        let (a, b) = (ints(&va, &sa), ints(&vb, &sb));

        let out = compare(&a, &b, CompareOp::Lt).unwrap().into_array().unwrap();
        let shape = out.shape();
        let got = read(&out);
        let mut idx = vec![0usize; ndim];
        for &value in &got {
            let pick = |s: &[usize]| -> Vec<usize> {
                idx.iter().zip(s).map(|(&i, &d)| if d == 1 { 0 } else { i }).collect()
            };
            let x = a.get(&pick(&sa)).unwrap();
            let y = b.get(&pick(&sb)).unwrap();
            assert_eq!(value, x.partial_cmp_value(&y) == Some(Ordering::Less));
            for axis in (0..ndim).rev() {
                idx[axis] += 1;
                if idx[axis] < shape[axis] {
                    break;
                }
                idx[axis] = 0;
            }
        }
    }
}

// ============================================================================
// Masks
// ============================================================================

#[test]
fn test_missing_positions_propagate() {
    let a = ints(&[1, 2, 3], &[3]);
    a.allocate_mask(true).unwrap();
    a.set_valid(&[1], false).unwrap();

    let out = compare(&a, &a, CompareOp::Eq).unwrap().into_array().unwrap();
    assert_eq!(out.mask_values().unwrap(), vec![true, false, true]);
    assert_eq!(read(&out), vec![true, false, true]);
    assert_eq!(out.count_missing(), 1);

    let b = ints(&[1, 0, 0], &[3]);
    let out = compare(&a, &b, CompareOp::Ne).unwrap().into_array().unwrap();
    assert_eq!(out.mask_values().unwrap(), vec![true, false, true]);
    assert_eq!(read(&out), vec![false, false, true]);
}

#[test]
fn test_ignore_policy_compares_data() {
    let a = ints(&[1, 2, 3], &[3]);
    a.allocate_mask(true).unwrap();
    a.set_valid(&[1], false).unwrap();
    let engine = Comparator::new(CompareOptions::default().with_mask_policy(MaskPolicy::Ignore));
    let out = engine.compare(&a, &a, CompareOp::Eq).unwrap().into_array().unwrap();
    assert!(!out.has_mask());
    assert_eq!(read(&out), vec![true, true, true]);
}

// ============================================================================
// Element kinds
// ============================================================================

#[test]
fn test_nan_is_unordered() {
    let values = [Scalar::Float(1.0), Scalar::Float(f64::NAN)];
    let a = Array::from_scalars(DType::float64(), &[2], &values).unwrap();
    assert_eq!(result(compare(&a, &a, CompareOp::Eq).unwrap()), vec![true, false]);
    assert_eq!(result(compare(&a, &a, CompareOp::Ne).unwrap()), vec![false, true]);
    assert_eq!(result(compare(&a, &a, CompareOp::Le).unwrap()), vec![true, false]);
}

#[test]
fn test_mixed_numeric_dtypes() {
    let a = ints(&[1, 2, 3], &[3]);
    let values = [Scalar::Float(1.0), Scalar::Float(2.5), Scalar::Float(2.5)];
    let f = Array::from_scalars(DType::float32(), &[3], &values).unwrap();
    assert_eq!(result(compare(&a, &f, CompareOp::Lt).unwrap()), vec![false, true, false]);
    let l = Operand::List(vec![Scalar::Bool(true), Scalar::Int(2), Scalar::UInt(7)]);
    assert_eq!(result(compare(&a, l, CompareOp::Eq).unwrap()), vec![true, true, false]);
}

#[test]
fn test_complex_order_is_lexicographic() {
    let values = [
        Scalar::Complex(Complex64::new(1.0, 2.0)),
        Scalar::Complex(Complex64::new(1.0, 3.0)),
        Scalar::Complex(Complex64::new(0.5, 9.0)),
    ];
    let a = Array::from_scalars(DType::complex128(), &[3], &values).unwrap();
    let pivot = Scalar::Complex(Complex64::new(1.0, 2.0));
    assert_eq!(result(compare(&a, pivot.clone(), CompareOp::Gt).unwrap()), vec![false, true, false]);
    assert_eq!(result(compare(&a, pivot, CompareOp::Eq).unwrap()), vec![true, false, false]);
}

#[test]
fn test_generic_references() {
    let values = [Scalar::Int(1), Scalar::from("a"), Scalar::None];
    let a = Array::from_scalars(DType::object(), &[3], &values).unwrap();
    assert_eq!(result(compare(&a, Scalar::Int(1), CompareOp::Eq).unwrap()), vec![true, false, false]);
    assert_eq!(result(compare(&a, Scalar::Int(1), CompareOp::Ne).unwrap()), vec![false, true, true]);
    assert_eq!(result(compare(&a, Scalar::from("a"), CompareOp::Eq).unwrap()), vec![false, true, false]);
    assert_eq!(compare(&a, Operand::None, CompareOp::Eq).unwrap().as_bool(), Some(false));
}

/// Fixed-point number with two decimal digits, stored as an `i32`.
struct Cents;

impl Cents {
    fn raw(bytes: &[u8]) -> i32 {
        i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl ElementKind for Cents {
    fn name(&self) -> &'static str {
        "cents"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> strided_dtype::Result<Scalar> {
        Ok(Scalar::Float(Self::raw(bytes) as f64 / 100.0))
    }

    fn set_value(&self, _dtype: &DType, bytes: &mut [u8], value: &Scalar) -> strided_dtype::Result<()> {
        let v = value.as_f64().unwrap_or(0.0);
        bytes[..4].copy_from_slice(&((v * 100.0).round() as i32).to_ne_bytes());
        Ok(())
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        Some(Self::raw(a).cmp(&Self::raw(b)))
    }
}

#[test]
fn test_user_kind_through_registry() {
    let mut registry = KindRegistry::with_builtins();
    registry.register(Kind::User(7), Arc::new(Cents));
    let config = ArrayConfig::new().with_registry(Arc::new(registry)).into_shared();
    let dtype = DType::user(7, 4, 4).unwrap();
    let a = Array::zeros_in(&config, dtype, &[3], MemoryOrder::C).unwrap();
    for (i, v) in [1.25, 0.5, 2.0].into_iter().enumerate() {
        a.set(&[i], &Scalar::Float(v)).unwrap();
    }
    assert_relative_eq!(a.get(&[0]).unwrap().as_f64().unwrap(), 1.25);

    assert_eq!(result(compare(&a, &a, CompareOp::Eq).unwrap()), vec![true, true, true]);
    assert_eq!(
        result(compare(&a, Scalar::Float(1.0), CompareOp::Gt).unwrap()),
        vec![true, false, true]
    );
}

#[test]
fn test_unregistered_user_kind_is_an_error() {
    let config = ArrayConfig::new()
        .with_registry(Arc::new(KindRegistry::with_builtins()))
        .into_shared();
    let a = Array::zeros_in(&config, DType::user(9, 4, 4).unwrap(), &[2], MemoryOrder::C).unwrap();
    assert!(matches!(
        compare(&a, &a, CompareOp::Eq),
        Err(CompareError::DType(_))
    ));
}

// ============================================================================
// Dispatch seam
// ============================================================================

#[derive(Debug, Default)]
struct Refusing {
    calls: Cell<usize>,
}

impl BinaryDispatcher for Refusing {
    fn dispatch(
        &self,
        _lhs: &Array,
        _rhs: &Array,
        _op: CompareOp,
        _options: &CompareOptions,
    ) -> strided_compare::Result<Option<Array>> {
        self.calls.set(self.calls.get() + 1);
        Ok(None)
    }
}

#[test]
fn test_dispatcher_refusal_falls_back() {
    let engine = Comparator::with_dispatcher(CompareOptions::default(), Box::new(Refusing::default()));
    let a = ints(&[1, 2], &[2]);
    assert!(engine.compare(&a, &a, CompareOp::Eq).unwrap().is_not_implemented());

    let values = [Scalar::from("x"), Scalar::from("y")];
    let s = Array::from_scalars(DType::unicode(1).unwrap(), &[2], &values).unwrap();
    assert_eq!(result(engine.compare(&s, &s, CompareOp::Eq).unwrap()), vec![true, true]);
}
