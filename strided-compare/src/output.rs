//! Boolean result arrays: pairwise fill, AND/OR folding and trailing-axis
//! reduction.

use strided_array::{broadcast_shapes, Array, MemoryOrder, MultiIter};
use strided_dtype::{DType, Scalar};

use crate::{CompareOp, MaskPolicy, Result};

/// Fresh C-ordered boolean array over the broadcast shape of `lhs` and `rhs`,
/// holding `pair(a, b)` for every position.
///
/// Under [`MaskPolicy::Propagate`] a masked input gives the result a mask;
/// positions where either input is missing are missing and hold `false`
/// without calling `pair`.
pub(crate) fn compare_pairs<F>(lhs: &Array, rhs: &Array, policy: MaskPolicy, mut pair: F) -> Result<Array>
where
    F: FnMut(*const u8, *const u8) -> Result<bool>,
{
    let (ls, rs) = (lhs.shape(), rhs.shape());
    let shape = broadcast_shapes(&[ls.as_slice(), rs.as_slice()])?;
    let out = Array::zeros_in(lhs.config(), DType::bool(), &shape, MemoryOrder::C)?;
    let masked = policy == MaskPolicy::Propagate && (lhs.has_mask() || rhs.has_mask());
    if masked {
        out.allocate_mask(true)?;
    }

    let mut iter = MultiIter::with_shape(&[&out, lhs, rhs], &shape)?;
    while let Some(ptrs) = iter.next() {
        let (o, a, b) = (ptrs[0], ptrs[1], ptrs[2]);
        let valid = !masked || (iter.is_valid(1) && iter.is_valid(2));
        let value = if valid { pair(a, b)? } else { false };
        unsafe { *o = value as u8 };
        if let Some(m) = iter.mask_ptr(0) {
            unsafe { *m = valid as u8 };
        }
    }
    Ok(out)
}

/// Fold two boolean arrays: AND for `==`, OR for `!=`.
pub(crate) fn fold(acc: &Array, part: &Array, op: CompareOp) -> Result<Array> {
    let all = op == CompareOp::Eq;
    compare_pairs(acc, part, MaskPolicy::Propagate, |a, b| {
        let (a, b) = unsafe { (*a != 0, *b != 0) };
        Ok(if all { a && b } else { a || b })
    })
}

/// Reduce every axis of `part` past the first `keep` with the same AND/OR.
///
/// A reduced position is missing when any element of its group is.
pub(crate) fn reduce_trailing(part: &Array, keep: usize, op: CompareOp) -> Result<Array> {
    let shape = part.shape();
    let mut kept = shape[..keep].to_vec();
    kept.extend(std::iter::repeat(1).take(shape.len() - keep));

    let all = op == CompareOp::Eq;
    let out = Array::zeros_in(part.config(), DType::bool(), &kept, MemoryOrder::C)?;
    out.assign_scalar(&Scalar::Bool(all))?;
    if part.has_mask() {
        out.allocate_mask(true)?;
    }

    let mut iter = MultiIter::with_shape(&[&out, part], &shape)?;
    while let Some(ptrs) = iter.next() {
        let (o, v) = (ptrs[0], ptrs[1]);
        unsafe {
            let v = (*v != 0) as u8;
            if all {
                *o &= v;
            } else {
                *o |= v;
            }
        }
        if !iter.is_valid(1) {
            if let Some(m) = iter.mask_ptr(0) {
                unsafe { *m = 0 };
            }
        }
    }

    out.reshape_in_place(&shape[..keep], MemoryOrder::C)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bools(values: &[bool], shape: &[usize]) -> Array {
        let values: Vec<Scalar> = values.iter().map(|&b| Scalar::Bool(b)).collect();
        Array::from_scalars(DType::bool(), shape, &values).unwrap()
    }

    fn read(a: &Array) -> Vec<bool> {
        a.to_scalars()
            .unwrap()
            .into_iter()
            .map(|s| s == Scalar::Bool(true))
            .collect()
    }

    #[test]
    fn test_fold_and_or() {
        let a = bools(&[true, true, false, false], &[4]);
        let b = bools(&[true, false, true, false], &[4]);
        assert_eq!(read(&fold(&a, &b, CompareOp::Eq).unwrap()), vec![true, false, false, false]);
        assert_eq!(read(&fold(&a, &b, CompareOp::Ne).unwrap()), vec![true, true, true, false]);
    }

    #[test]
    fn test_reduce_trailing_axes() {
        let part = bools(&[true, true, true, false, false, false], &[2, 3]);
        let all = reduce_trailing(&part, 1, CompareOp::Eq).unwrap();
        assert_eq!(all.shape(), vec![2]);
        assert_eq!(read(&all), vec![true, false]);
        let any = reduce_trailing(&part, 1, CompareOp::Ne).unwrap();
        assert_eq!(read(&any), vec![true, false]);
    }

    #[test]
    fn test_reduce_marks_group_missing() {
        let part = bools(&[true, true, true, true], &[2, 2]);
        part.allocate_mask(true).unwrap();
        part.set_valid(&[1, 0], false).unwrap();
        let out = reduce_trailing(&part, 1, CompareOp::Eq).unwrap();
        assert_eq!(out.mask_values().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_pairs_propagate_missing() {
        let a = bools(&[true, true], &[2]);
        let b = bools(&[true, true], &[2]);
        b.allocate_mask(true).unwrap();
        b.set_valid(&[0], false).unwrap();
        let out = compare_pairs(&a, &b, MaskPolicy::Propagate, |_, _| Ok(true)).unwrap();
        assert_eq!(out.mask_values().unwrap(), vec![false, true]);
        assert_eq!(read(&out), vec![false, true]);

        let out = compare_pairs(&a, &b, MaskPolicy::Ignore, |_, _| Ok(true)).unwrap();
        assert!(!out.has_mask());
        assert_eq!(read(&out), vec![true, true]);
    }
}
