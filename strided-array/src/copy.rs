//! Broadcasting, overlap-tolerant element copy and deferred write-back.

use strided_dtype::DType;

use crate::alloc::Buffer;
use crate::base::Base;
use crate::broadcast::{IterOperand, MultiIter};
use crate::config::ArrayConfig;
use crate::flags::{ArrayFlags, MemoryOrder};
use crate::layout::{self, byte_bounds};
use crate::{Array, ArrayError, Result};

/// Byte range `[lo, hi)` touched by an operand's data.
fn data_span(data: *mut u8, shape: &[usize], strides: &[isize], itemsize: usize) -> (usize, usize) {
    let (lo, hi) = byte_bounds(shape, strides, itemsize);
    let base = data as usize;
    (base.wrapping_add_signed(lo), base.wrapping_add_signed(hi))
}

fn spans_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < a.1 && b.0 < b.1 && a.0 < b.1 && b.0 < a.1
}

fn operands_overlap(dst: &IterOperand, dst_item: usize, src: &IterOperand, src_item: usize) -> bool {
    let data = spans_overlap(
        data_span(dst.data, &dst.shape, &dst.strides, dst_item),
        data_span(src.data, &src.shape, &src.strides, src_item),
    );
    let mask = match (&dst.mask, &src.mask) {
        (Some((dm, ds)), Some((sm, ss))) => spans_overlap(
            data_span(*dm, &dst.shape, ds, 1),
            data_span(*sm, &src.shape, ss, 1),
        ),
        _ => false,
    };
    data || mask
}

/// Copy `src` into `dst`, broadcasting `src` to `dst`'s shape.
///
/// Elements of equal dtypes are copied with the reference-aware primitive;
/// otherwise each value is decoded and re-encoded. Overlapping operands are
/// staged through a temporary. When `dst` is masked its mask receives the
/// source validity; an unmasked `dst` refuses sources with missing values.
pub(crate) fn copy_operands(
    config: &ArrayConfig,
    dst_dtype: &DType,
    dst: &IterOperand,
    src_dtype: &DType,
    src: &IterOperand,
) -> Result<()> {
    if src.mask.is_some() && dst.mask.is_none() {
        let mut iter = MultiIter::from_operands(std::slice::from_ref(src), &src.shape)?;
        while iter.next().is_some() {
            if !iter.is_valid(0) {
                return Err(ArrayError::MaskNotPresent);
            }
        }
    }
    if operands_overlap(dst, dst_dtype.itemsize(), src, src_dtype.itemsize()) {
        tracing::trace!("staging overlapping copy");
        return copy_staged(config, dst_dtype, dst, src_dtype, src);
    }

    let registry = config.registry();
    let same = dst_dtype == src_dtype;
    let (dst_item, src_item) = (dst_dtype.itemsize(), src_dtype.itemsize());
    let mut iter = MultiIter::from_operands(&[dst.clone(), src.clone()], &dst.shape)?;
    while let Some(ptrs) = iter.next() {
        let (d, s) = (ptrs[0], ptrs[1]);
        if same {
            unsafe { registry.copy_item(dst_dtype, d, s) };
        } else {
            let value = registry.get_value(src_dtype, unsafe { std::slice::from_raw_parts(s, src_item) })?;
            registry.set_value(dst_dtype, unsafe { std::slice::from_raw_parts_mut(d, dst_item) }, &value)?;
        }
        if let Some(m) = iter.mask_ptr(0) {
            let valid = iter.is_valid(1);
            unsafe { *m = valid as u8 };
        }
    }
    Ok(())
}

fn copy_staged(
    config: &ArrayConfig,
    dst_dtype: &DType,
    dst: &IterOperand,
    src_dtype: &DType,
    src: &IterOperand,
) -> Result<()> {
    let size = layout::checked_size(&src.shape).unwrap_or(0);
    let itemsize = src_dtype.itemsize();
    let data = Buffer::zeroed(config.allocator(), size * itemsize, src_dtype.alignment())?;
    let strides = layout::c_strides(&src.shape, itemsize);
    let mut temp = IterOperand::plain(data.as_ptr(), &src.shape, &strides);
    let mask = match src.mask {
        Some(_) => {
            let m = Buffer::zeroed(config.allocator(), size, 1)?;
            temp.mask = Some((m.as_ptr(), layout::c_strides(&src.shape, 1)));
            Some(m)
        }
        None => None,
    };

    let mut result = copy_operands(config, src_dtype, &temp, src_dtype, src);
    if result.is_ok() {
        result = copy_operands(config, dst_dtype, dst, src_dtype, &temp);
    }

    let registry = config.registry();
    if registry.has_references(src_dtype) {
        for i in 0..size {
            unsafe { registry.release_item(src_dtype, data.as_ptr().add(i * itemsize)) };
        }
    }
    drop(mask);
    result
}

impl Array {
    /// Copy `src` into this array, broadcasting it to this array's shape.
    ///
    /// Tolerates `src` aliasing this array's memory.
    pub fn copy_from(&self, src: &Array) -> Result<()> {
        if !self.is_writeable() {
            return Err(ArrayError::NotWriteable);
        }
        copy_operands(
            self.config(),
            self.dtype(),
            &self.obj.operand(),
            src.dtype(),
            &src.obj.operand(),
        )
    }

    /// Fresh owning copy in `order`, mask included.
    pub fn copy(&self, order: MemoryOrder) -> Result<Array> {
        let out = Array::zeros_in(self.config(), self.dtype().clone(), &self.shape(), order)?;
        if self.has_mask() {
            out.allocate_mask(true)?;
        }
        out.copy_from(self)?;
        Ok(out)
    }

    /// Private copy whose contents are written back into this array when
    /// the copy is destroyed.
    ///
    /// This array stays read-only until then. The copy's base is this array
    /// itself, not its memory owner.
    pub fn writeback_copy(&self, order: MemoryOrder) -> Result<Array> {
        if !self.is_writeable() {
            return Err(ArrayError::NotWriteable);
        }
        let out = self.copy(order)?;
        let flags = (out.flags() - ArrayFlags::OWN_DATA) | ArrayFlags::DEFERRED_WRITEBACK;
        out.obj.flags.set(flags);
        *out.obj.base.borrow_mut() = Some(Base::Array(self.clone()));
        self.obj.flags.set(self.flags() - ArrayFlags::WRITEABLE);
        self.obj.leased.set(true);
        tracing::trace!(shape = ?self.shape(), "created deferred write-back copy");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strided_dtype::Scalar;

    fn arange(n: i64, shape: &[usize]) -> Array {
        let values: Vec<Scalar> = (0..n).map(Scalar::Int).collect();
        Array::from_scalars(strided_dtype::DType::int64(), shape, &values).unwrap()
    }

    fn ints(a: &Array) -> Vec<i64> {
        a.to_scalars()
            .unwrap()
            .into_iter()
            .map(|s| match s {
                Scalar::Int(v) => v,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_copy_broadcasts_source() {
        let dst = Array::zeros(strided_dtype::DType::int64(), &[2, 3], MemoryOrder::C).unwrap();
        let row = arange(3, &[3]);
        dst.copy_from(&row).unwrap();
        assert_eq!(ints(&dst), vec![0, 1, 2, 0, 1, 2]);
        let bad = arange(2, &[2]);
        assert!(matches!(dst.copy_from(&bad), Err(ArrayError::ShapeMismatch(_, _))));
    }

    #[test]
    fn test_copy_converts_dtype() {
        let dst = Array::zeros(strided_dtype::DType::float64(), &[3], MemoryOrder::C).unwrap();
        dst.copy_from(&arange(3, &[3])).unwrap();
        assert_eq!(dst.get(&[2]).unwrap(), Scalar::Float(2.0));
    }

    #[test]
    fn test_overlapping_copy_is_staged() {
        let a = arange(5, &[5]);
        let head = a.slice_axis(0, 0..4, 1).unwrap();
        let tail = a.slice_axis(0, 1..5, 1).unwrap();
        tail.copy_from(&head).unwrap();
        assert_eq!(ints(&a), vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_reversed_self_copy() {
        let a = arange(4, &[4]);
        let rev = a.slice_axis(0, 0..4, -1).unwrap();
        a.copy_from(&rev).unwrap();
        assert_eq!(ints(&a), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_copy_into_read_only_fails() {
        let a = arange(3, &[3]);
        let b = a.broadcast_to(&[2, 3]).unwrap();
        assert!(matches!(b.copy_from(&a), Err(ArrayError::NotWriteable)));
    }

    #[test]
    fn test_missing_values_need_masked_destination() {
        let src = arange(3, &[3]);
        src.allocate_mask(true).unwrap();
        src.set_valid(&[1], false).unwrap();
        let plain = Array::zeros(strided_dtype::DType::int64(), &[3], MemoryOrder::C).unwrap();
        assert!(matches!(plain.copy_from(&src), Err(ArrayError::MaskNotPresent)));

        let copy = src.copy(MemoryOrder::F).unwrap();
        assert!(copy.owns_mask());
        assert_eq!(copy.mask_values().unwrap(), vec![true, false, true]);
        assert_eq!(ints(&copy), vec![0, 1, 2]);
    }
}
