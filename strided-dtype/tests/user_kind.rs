use std::cmp::Ordering;
use std::sync::Arc;

use strided_dtype::{DType, ElementKind, Kind, KindRegistry, Result, Scalar};

/// Fixed-point number with two decimal digits, stored as an `i32`.
struct Cents;

impl ElementKind for Cents {
    fn name(&self) -> &'static str {
        "cents"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        let raw = i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Scalar::Float(raw as f64 / 100.0))
    }

    fn set_value(&self, _dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let v = value.as_f64().unwrap_or(0.0);
        bytes[..4].copy_from_slice(&((v * 100.0).round() as i32).to_ne_bytes());
        Ok(())
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let x = i32::from_ne_bytes([a[0], a[1], a[2], a[3]]);
        let y = i32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        Some(x.cmp(&y))
    }
}

#[test]
fn test_user_kind_registration() {
    let mut reg = KindRegistry::with_builtins();
    assert!(reg.register(Kind::User(1), Arc::new(Cents)).is_none());
    let dt = DType::user(1, 4, 4).unwrap();

    let mut a = [0u8; 4];
    let mut b = [0u8; 4];
    reg.set_value(&dt, &mut a, &Scalar::Float(1.25)).unwrap();
    reg.set_value(&dt, &mut b, &Scalar::Float(1.5)).unwrap();
    assert_eq!(reg.get_value(&dt, &a).unwrap(), Scalar::Float(1.25));
    assert_eq!(reg.compare_raw(&dt, &a, &b), Some(Ordering::Less));
    assert!(!reg.has_references(&dt));
}

#[test]
fn test_user_kind_inside_record() {
    let mut reg = KindRegistry::with_builtins();
    reg.register(Kind::User(1), Arc::new(Cents));
    let dt = DType::record_packed(vec![
        ("price", DType::user(1, 4, 4).unwrap()),
        ("qty", DType::int32()),
    ])
    .unwrap();
    let mut buf = vec![0u8; dt.itemsize()];
    let value = Scalar::Record(vec![Scalar::Float(9.99), Scalar::Int(3)]);
    reg.set_value(&dt, &mut buf, &value).unwrap();
    assert_eq!(reg.get_value(&dt, &buf).unwrap(), value);
}
