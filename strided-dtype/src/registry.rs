//! Kind-tag to capability registry.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::element_kind::{
    BoolKind, BytesKind, ComplexKind, ElementKind, FloatKind, IntKind, ObjectKind, UIntKind,
    UnicodeKind, VoidKind,
};
use crate::{DType, DTypeError, Kind, Result, Scalar};

/// Maps kind tags to [`ElementKind`] capabilities.
///
/// Record and sub-array dtypes are never registered; the registry walks
/// their fields or items and dispatches each to the capability of the
/// underlying kind.
#[derive(Clone)]
pub struct KindRegistry {
    kinds: HashMap<Kind, Arc<dyn ElementKind>>,
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.kinds.values().map(|k| k.name()).collect();
        names.sort_unstable();
        f.debug_struct("KindRegistry").field("kinds", &names).finish()
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Registry holding every builtin kind.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.register(Kind::Bool, Arc::new(BoolKind));
        reg.register(Kind::Int, Arc::new(IntKind));
        reg.register(Kind::UInt, Arc::new(UIntKind));
        reg.register(Kind::Float, Arc::new(FloatKind));
        reg.register(Kind::Complex, Arc::new(ComplexKind));
        reg.register(Kind::Bytes, Arc::new(BytesKind));
        reg.register(Kind::Unicode, Arc::new(UnicodeKind));
        reg.register(Kind::Void, Arc::new(VoidKind));
        reg.register(Kind::Object, Arc::new(ObjectKind));
        reg
    }

    /// Process-wide builtin registry, built on first use.
    pub fn builtin() -> Arc<KindRegistry> {
        static BUILTIN: OnceLock<Arc<KindRegistry>> = OnceLock::new();
        Arc::clone(BUILTIN.get_or_init(|| Arc::new(Self::with_builtins())))
    }

    /// Register a capability, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: Kind,
        capability: Arc<dyn ElementKind>,
    ) -> Option<Arc<dyn ElementKind>> {
        self.kinds.insert(kind, capability)
    }

    pub fn lookup(&self, kind: Kind) -> Result<&Arc<dyn ElementKind>> {
        self.kinds.get(&kind).ok_or(DTypeError::UnknownKind(kind))
    }

    pub fn contains(&self, kind: Kind) -> bool {
        kind == Kind::Record || self.kinds.contains_key(&kind)
    }

    // ========================================================================
    // Composed primitives
    // ========================================================================

    pub fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        if let Some(sub) = dtype.subarray_info() {
            let step = sub.base.itemsize();
            return bytes[..dtype.itemsize()]
                .chunks_exact(step)
                .map(|item| self.get_value(&sub.base, item))
                .collect::<Result<Vec<_>>>()
                .map(Scalar::Record);
        }
        if let Some(fields) = dtype.fields() {
            return fields
                .iter()
                .map(|f| self.get_value(&f.dtype, &bytes[f.offset..f.offset + f.dtype.itemsize()]))
                .collect::<Result<Vec<_>>>()
                .map(Scalar::Record);
        }
        self.lookup(dtype.kind())?.get_value(dtype, bytes)
    }

    pub fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        if let Some(sub) = dtype.subarray_info() {
            let step = sub.base.itemsize();
            let count = dtype.itemsize() / step;
            return match value.unwrap_object() {
                Scalar::Record(items) => {
                    if items.len() != count {
                        return Err(DTypeError::FieldCountMismatch {
                            expected: count,
                            found: items.len(),
                        });
                    }
                    for (slot, item) in bytes[..dtype.itemsize()].chunks_exact_mut(step).zip(items) {
                        self.set_value(&sub.base, slot, item)?;
                    }
                    Ok(())
                }
                // A single value fills every item.
                other => {
                    for slot in bytes[..dtype.itemsize()].chunks_exact_mut(step) {
                        self.set_value(&sub.base, slot, other)?;
                    }
                    Ok(())
                }
            };
        }
        if let Some(fields) = dtype.fields() {
            let items = match value.unwrap_object() {
                Scalar::Record(items) => items,
                other => {
                    return Err(DTypeError::ValueMismatch {
                        expected: "record",
                        found: other.type_name(),
                    })
                }
            };
            if items.len() != fields.len() {
                return Err(DTypeError::FieldCountMismatch {
                    expected: fields.len(),
                    found: items.len(),
                });
            }
            for (f, item) in fields.iter().zip(items) {
                let end = f.offset + f.dtype.itemsize();
                self.set_value(&f.dtype, &mut bytes[f.offset..end], item)?;
            }
            return Ok(());
        }
        self.lookup(dtype.kind())?.set_value(dtype, bytes, value)
    }

    /// Order two elements of `dtype`; records and sub-arrays compare
    /// lexicographically in field/item order.
    pub fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        if let Some(sub) = dtype.subarray_info() {
            let step = sub.base.itemsize();
            let n = dtype.itemsize();
            for (x, y) in a[..n].chunks_exact(step).zip(b[..n].chunks_exact(step)) {
                match self.compare_raw(&sub.base, x, y)? {
                    Ordering::Equal => continue,
                    ord => return Some(ord),
                }
            }
            return Some(Ordering::Equal);
        }
        if let Some(fields) = dtype.fields() {
            for f in fields.iter() {
                let range = f.offset..f.offset + f.dtype.itemsize();
                match self.compare_raw(&f.dtype, &a[range.clone()], &b[range])? {
                    Ordering::Equal => continue,
                    ord => return Some(ord),
                }
            }
            return Some(Ordering::Equal);
        }
        self.lookup(dtype.kind()).ok()?.compare_raw(dtype, a, b)
    }

    /// Whether any element of `dtype` holds counted references.
    pub fn has_references(&self, dtype: &DType) -> bool {
        if let Some(sub) = dtype.subarray_info() {
            return self.has_references(&sub.base);
        }
        if let Some(fields) = dtype.fields() {
            return fields.iter().any(|f| self.has_references(&f.dtype));
        }
        self.lookup(dtype.kind())
            .map(|k| k.has_references())
            .unwrap_or(false)
    }

    /// Reference-aware element copy.
    ///
    /// # Safety
    /// See [`ElementKind::copy_item`].
    pub unsafe fn copy_item(&self, dtype: &DType, dst: *mut u8, src: *const u8) {
        if !self.has_references(dtype) {
            std::ptr::copy(src, dst, dtype.itemsize());
            return;
        }
        if let Some(sub) = dtype.subarray_info() {
            let step = sub.base.itemsize();
            for i in 0..dtype.itemsize() / step {
                self.copy_item(&sub.base, dst.add(i * step), src.add(i * step));
            }
            return;
        }
        if let Some(fields) = dtype.fields() {
            for f in fields.iter() {
                self.copy_item(&f.dtype, dst.add(f.offset), src.add(f.offset));
            }
            return;
        }
        if let Ok(kind) = self.lookup(dtype.kind()) {
            kind.copy_item(dtype, dst, src);
        }
    }

    /// Release the references held by one element.
    ///
    /// # Safety
    /// See [`ElementKind::release_item`].
    pub unsafe fn release_item(&self, dtype: &DType, item: *mut u8) {
        if !self.has_references(dtype) {
            return;
        }
        if let Some(sub) = dtype.subarray_info() {
            let step = sub.base.itemsize();
            for i in 0..dtype.itemsize() / step {
                self.release_item(&sub.base, item.add(i * step));
            }
            return;
        }
        if let Some(fields) = dtype.fields() {
            for f in fields.iter() {
                self.release_item(&f.dtype, item.add(f.offset));
            }
            return;
        }
        if let Ok(kind) = self.lookup(dtype.kind()) {
            kind.release_item(dtype, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn test_record_roundtrip() {
        let reg = KindRegistry::with_builtins();
        let dt = DType::record_packed(vec![
            ("id", DType::int32()),
            ("name", DType::bytes(3).unwrap()),
        ])
        .unwrap();
        let mut buf = vec![0u8; dt.itemsize()];
        let value = Scalar::Record(vec![Scalar::Int(9), Scalar::Bytes(b"xy".to_vec())]);
        reg.set_value(&dt, &mut buf, &value).unwrap();
        assert_eq!(reg.get_value(&dt, &buf).unwrap(), value);

        let short = Scalar::Record(vec![Scalar::Int(1)]);
        assert!(matches!(
            reg.set_value(&dt, &mut buf, &short),
            Err(DTypeError::FieldCountMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_subarray_fill() {
        let reg = KindRegistry::with_builtins();
        let dt = DType::subarray(DType::int32(), &[3]).unwrap();
        let mut buf = vec![0u8; dt.itemsize()];
        reg.set_value(&dt, &mut buf, &Scalar::Int(4)).unwrap();
        assert_eq!(
            reg.get_value(&dt, &buf).unwrap(),
            Scalar::Record(vec![Scalar::Int(4); 3])
        );
    }

    #[test]
    fn test_record_compare_in_field_order() {
        let reg = KindRegistry::with_builtins();
        // "b" is stored first but declared second.
        let dt = DType::record(vec![
            Field::new("a", DType::int32(), 4),
            Field::new("b", DType::int32(), 0),
        ])
        .unwrap();
        let mut x = vec![0u8; 8];
        let mut y = vec![0u8; 8];
        reg.set_value(&dt, &mut x, &Scalar::Record(vec![Scalar::Int(1), Scalar::Int(9)]))
            .unwrap();
        reg.set_value(&dt, &mut y, &Scalar::Record(vec![Scalar::Int(2), Scalar::Int(0)]))
            .unwrap();
        assert_eq!(reg.compare_raw(&dt, &x, &y), Some(Ordering::Less));
    }

    #[test]
    fn test_unknown_user_kind() {
        let reg = KindRegistry::with_builtins();
        let dt = DType::user(3, 4, 4).unwrap();
        assert!(matches!(
            reg.get_value(&dt, &[0; 4]),
            Err(DTypeError::UnknownKind(Kind::User(3)))
        ));
        assert!(!reg.contains(Kind::User(3)));
        assert!(reg.contains(Kind::Record));
    }

    #[test]
    fn test_record_has_references() {
        let reg = KindRegistry::builtin();
        let plain = DType::record_packed(vec![("a", DType::float64())]).unwrap();
        let with_obj =
            DType::record_packed(vec![("a", DType::float64()), ("o", DType::object())]).unwrap();
        assert!(!reg.has_references(&plain));
        assert!(reg.has_references(&with_obj));
    }
}
