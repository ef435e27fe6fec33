//! Per-kind element capabilities.
//!
//! An [`ElementKind`] knows the bit layout of one element kind. The array and
//! comparison layers never read element bytes directly; they go through these
//! primitives (usually via [`KindRegistry`](crate::KindRegistry), which also
//! composes records and sub-arrays out of them).

use std::cmp::Ordering;
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;

use bytemuck::Pod;
use num_complex::Complex64;
use num_traits::NumCast;

use crate::{DType, DTypeError, Result, Scalar};

/// Capability interface for one element kind.
///
/// `bytes` slices passed to the primitives are exactly `dtype.itemsize()`
/// long and carry no alignment guarantee.
pub trait ElementKind: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decode one element.
    fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar>;

    /// Encode `value` into one element.
    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()>;

    /// Order two elements of the same dtype. `None` means unordered.
    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering>;

    /// Whether elements hold counted references that need acquire/release.
    fn has_references(&self) -> bool {
        false
    }

    /// Copy one element from `src` to `dst`, releasing what `dst` held.
    ///
    /// # Safety
    /// Both pointers must address `dtype.itemsize()` valid bytes holding
    /// elements of this kind. The regions may overlap.
    unsafe fn copy_item(&self, dtype: &DType, dst: *mut u8, src: *const u8) {
        ptr::copy(src, dst, dtype.itemsize());
    }

    /// Release whatever the element at `item` references.
    ///
    /// # Safety
    /// `item` must address a valid element of this kind.
    unsafe fn release_item(&self, _dtype: &DType, _item: *mut u8) {}
}

// ============================================================================
// Byte helpers
// ============================================================================

#[inline]
fn read_pod<T: Pod>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()])
}

#[inline]
fn write_pod<T: Pod>(bytes: &mut [u8], value: T) {
    bytes[..size_of::<T>()].copy_from_slice(bytemuck::bytes_of(&value));
}

fn mismatch(expected: &'static str, value: &Scalar) -> DTypeError {
    DTypeError::ValueMismatch {
        expected,
        found: value.type_name(),
    }
}

fn cast_store<S: NumCast, T: NumCast + Pod>(
    bytes: &mut [u8],
    value: S,
    kind: &'static str,
) -> Result<()> {
    let v: T = num_traits::cast(value).ok_or(DTypeError::Overflow {
        kind,
        itemsize: size_of::<T>(),
    })?;
    write_pod(bytes, v);
    Ok(())
}

// ============================================================================
// Bool
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct BoolKind;

impl ElementKind for BoolKind {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::Bool(bytes[0] != 0))
    }

    fn set_value(&self, _dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let b = value.truthiness().ok_or_else(|| mismatch("bool", value))?;
        bytes[0] = b as u8;
        Ok(())
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        Some((a[0] != 0).cmp(&(b[0] != 0)))
    }
}

// ============================================================================
// Integers
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct IntKind;

impl IntKind {
    fn read(itemsize: usize, bytes: &[u8]) -> i64 {
        match itemsize {
            1 => read_pod::<i8>(bytes) as i64,
            2 => read_pod::<i16>(bytes) as i64,
            4 => read_pod::<i32>(bytes) as i64,
            _ => read_pod::<i64>(bytes),
        }
    }

    fn store<S: NumCast>(itemsize: usize, bytes: &mut [u8], v: S) -> Result<()> {
        match itemsize {
            1 => cast_store::<S, i8>(bytes, v, "int"),
            2 => cast_store::<S, i16>(bytes, v, "int"),
            4 => cast_store::<S, i32>(bytes, v, "int"),
            _ => cast_store::<S, i64>(bytes, v, "int"),
        }
    }
}

impl ElementKind for IntKind {
    fn name(&self) -> &'static str {
        "int"
    }

    fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::Int(Self::read(dtype.itemsize(), bytes)))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let n = dtype.itemsize();
        match value.unwrap_object() {
            Scalar::Bool(b) => Self::store(n, bytes, *b as i64),
            Scalar::Int(v) => Self::store(n, bytes, *v),
            Scalar::UInt(v) => Self::store(n, bytes, *v),
            Scalar::Float(v) => Self::store(n, bytes, *v),
            other => Err(mismatch("int", other)),
        }
    }

    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let n = dtype.itemsize();
        Some(Self::read(n, a).cmp(&Self::read(n, b)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UIntKind;

impl UIntKind {
    fn read(itemsize: usize, bytes: &[u8]) -> u64 {
        match itemsize {
            1 => bytes[0] as u64,
            2 => read_pod::<u16>(bytes) as u64,
            4 => read_pod::<u32>(bytes) as u64,
            _ => read_pod::<u64>(bytes),
        }
    }

    fn store<S: NumCast>(itemsize: usize, bytes: &mut [u8], v: S) -> Result<()> {
        match itemsize {
            1 => cast_store::<S, u8>(bytes, v, "uint"),
            2 => cast_store::<S, u16>(bytes, v, "uint"),
            4 => cast_store::<S, u32>(bytes, v, "uint"),
            _ => cast_store::<S, u64>(bytes, v, "uint"),
        }
    }
}

impl ElementKind for UIntKind {
    fn name(&self) -> &'static str {
        "uint"
    }

    fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::UInt(Self::read(dtype.itemsize(), bytes)))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let n = dtype.itemsize();
        match value.unwrap_object() {
            Scalar::Bool(b) => Self::store(n, bytes, *b as u64),
            Scalar::Int(v) => Self::store(n, bytes, *v),
            Scalar::UInt(v) => Self::store(n, bytes, *v),
            Scalar::Float(v) => Self::store(n, bytes, *v),
            other => Err(mismatch("uint", other)),
        }
    }

    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let n = dtype.itemsize();
        Some(Self::read(n, a).cmp(&Self::read(n, b)))
    }
}

// ============================================================================
// Floating point
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct FloatKind;

impl FloatKind {
    fn read(itemsize: usize, bytes: &[u8]) -> f64 {
        if itemsize == 4 {
            read_pod::<f32>(bytes) as f64
        } else {
            read_pod::<f64>(bytes)
        }
    }

    fn store(itemsize: usize, bytes: &mut [u8], v: f64) {
        if itemsize == 4 {
            write_pod(bytes, v as f32);
        } else {
            write_pod(bytes, v);
        }
    }
}

impl ElementKind for FloatKind {
    fn name(&self) -> &'static str {
        "float"
    }

    fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::Float(Self::read(dtype.itemsize(), bytes)))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        match value.unwrap_object() {
            Scalar::Complex(_) => Err(mismatch("float", value)),
            other => {
                let v = other.as_f64().ok_or_else(|| mismatch("float", other))?;
                Self::store(dtype.itemsize(), bytes, v);
                Ok(())
            }
        }
    }

    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let n = dtype.itemsize();
        Self::read(n, a).partial_cmp(&Self::read(n, b))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexKind;

impl ComplexKind {
    fn read(itemsize: usize, bytes: &[u8]) -> Complex64 {
        if itemsize == 8 {
            Complex64::new(
                read_pod::<f32>(&bytes[..4]) as f64,
                read_pod::<f32>(&bytes[4..]) as f64,
            )
        } else {
            Complex64::new(read_pod::<f64>(&bytes[..8]), read_pod::<f64>(&bytes[8..]))
        }
    }
}

impl ElementKind for ComplexKind {
    fn name(&self) -> &'static str {
        "complex"
    }

    fn get_value(&self, dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::Complex(Self::read(dtype.itemsize(), bytes)))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let c = value
            .as_complex()
            .ok_or_else(|| mismatch("complex", value))?;
        if dtype.itemsize() == 8 {
            write_pod(&mut bytes[..4], c.re as f32);
            write_pod(&mut bytes[4..], c.im as f32);
        } else {
            write_pod(&mut bytes[..8], c.re);
            write_pod(&mut bytes[8..], c.im);
        }
        Ok(())
    }

    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let n = dtype.itemsize();
        let (x, y) = (Self::read(n, a), Self::read(n, b));
        match x.re.partial_cmp(&y.re)? {
            Ordering::Equal => x.im.partial_cmp(&y.im),
            ord => Some(ord),
        }
    }
}

// ============================================================================
// Text and opaque bytes
// ============================================================================

/// Fixed-width byte strings. Shorter values are NUL padded; reads drop
/// trailing NULs.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesKind;

impl ElementKind for BytesKind {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(Scalar::Bytes(bytes[..end].to_vec()))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let src: &[u8] = match value.unwrap_object() {
            Scalar::Bytes(b) => b,
            Scalar::Text(s) => s.as_bytes(),
            other => return Err(mismatch("bytes", other)),
        };
        let width = dtype.itemsize();
        if src.len() > width {
            return Err(DTypeError::TextTooLong {
                width,
                len: src.len(),
            });
        }
        bytes[..src.len()].copy_from_slice(src);
        bytes[src.len()..width].fill(0);
        Ok(())
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        Some(a.cmp(b))
    }
}

/// Fixed-width code-point strings stored as native-endian `u32` units.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeKind;

impl UnicodeKind {
    fn units(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
        bytes.chunks_exact(4).map(read_pod::<u32>)
    }
}

impl ElementKind for UnicodeKind {
    fn name(&self) -> &'static str {
        "unicode"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        let units: Vec<u32> = Self::units(bytes).collect();
        let end = units.iter().rposition(|&u| u != 0).map_or(0, |i| i + 1);
        let text = units[..end]
            .iter()
            .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        Ok(Scalar::Text(text))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let units: Vec<u32> = match value.unwrap_object() {
            Scalar::Text(s) => s.chars().map(|c| c as u32).collect(),
            Scalar::Bytes(b) => b.iter().map(|&c| c as u32).collect(),
            other => return Err(mismatch("unicode", other)),
        };
        let width = dtype.itemsize() / 4;
        if units.len() > width {
            return Err(DTypeError::TextTooLong {
                width,
                len: units.len(),
            });
        }
        for (i, slot) in bytes[..width * 4].chunks_exact_mut(4).enumerate() {
            write_pod(slot, units.get(i).copied().unwrap_or(0));
        }
        Ok(())
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        Some(Self::units(a).cmp(Self::units(b)))
    }
}

/// Field-less opaque bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoidKind;

impl ElementKind for VoidKind {
    fn name(&self) -> &'static str {
        "void"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        Ok(Scalar::Bytes(bytes.to_vec()))
    }

    fn set_value(&self, dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        match value.unwrap_object() {
            Scalar::Bytes(b) if b.len() <= dtype.itemsize() => {
                bytes[..b.len()].copy_from_slice(b);
                bytes[b.len()..dtype.itemsize()].fill(0);
                Ok(())
            }
            Scalar::Bytes(b) => Err(DTypeError::TextTooLong {
                width: dtype.itemsize(),
                len: b.len(),
            }),
            other => Err(mismatch("void", other)),
        }
    }

    fn compare_raw(&self, _dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        Some(a.cmp(b))
    }
}

// ============================================================================
// Generic references
// ============================================================================

/// Counted references to host values.
///
/// Each slot holds either `0` (the absent value) or a pointer obtained from
/// `Arc::<Scalar>::into_raw`. The slot owns one strong count.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectKind;

impl ObjectKind {
    #[inline]
    fn read_slot(bytes: &[u8]) -> usize {
        read_pod::<usize>(bytes)
    }

    unsafe fn release_ptr(p: usize) {
        if p != 0 {
            drop(Arc::from_raw(p as *const Scalar));
        }
    }

    fn into_slot(value: &Scalar) -> usize {
        match value {
            Scalar::None => 0,
            Scalar::Object(inner) => Arc::into_raw(Arc::clone(inner)) as usize,
            other => Arc::into_raw(Arc::new(other.clone())) as usize,
        }
    }
}

impl ElementKind for ObjectKind {
    fn name(&self) -> &'static str {
        "object"
    }

    fn get_value(&self, _dtype: &DType, bytes: &[u8]) -> Result<Scalar> {
        let p = Self::read_slot(bytes);
        if p == 0 {
            return Ok(Scalar::None);
        }
        // Slot holds a live strong count.
        let value = unsafe { &*(p as *const Scalar) };
        Ok(value.clone())
    }

    fn set_value(&self, _dtype: &DType, bytes: &mut [u8], value: &Scalar) -> Result<()> {
        let new = Self::into_slot(value);
        let old = Self::read_slot(bytes);
        write_pod(bytes, new);
        unsafe { Self::release_ptr(old) };
        Ok(())
    }

    fn compare_raw(&self, dtype: &DType, a: &[u8], b: &[u8]) -> Option<Ordering> {
        let x = self.get_value(dtype, a).ok()?;
        let y = self.get_value(dtype, b).ok()?;
        x.partial_cmp_value(&y)
    }

    fn has_references(&self) -> bool {
        true
    }

    unsafe fn copy_item(&self, _dtype: &DType, dst: *mut u8, src: *const u8) {
        let p = ptr::read_unaligned(src as *const usize);
        if p != 0 {
            Arc::increment_strong_count(p as *const Scalar);
        }
        let old = ptr::read_unaligned(dst as *const usize);
        ptr::write_unaligned(dst as *mut usize, p);
        Self::release_ptr(old);
    }

    unsafe fn release_item(&self, _dtype: &DType, item: *mut u8) {
        let old = ptr::read_unaligned(item as *const usize);
        ptr::write_unaligned(item as *mut usize, 0);
        Self::release_ptr(old);
    }
}
