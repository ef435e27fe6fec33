//! Shape/stride descriptors and contiguity classification.
//!
//! All strides in this crate are signed **byte** offsets.

use smallvec::SmallVec;

use crate::flags::{ArrayFlags, MemoryOrder};
use crate::{ArrayError, Result};

/// Inline storage for per-axis extents.
pub type Shape = SmallVec<[usize; 4]>;
/// Inline storage for per-axis byte strides.
pub type Strides = SmallVec<[isize; 4]>;

// ============================================================================
// Stride helpers
// ============================================================================

/// Row-major byte strides (last index varies fastest).
///
/// Zero extents count as one so that strides stay meaningful for empty arrays.
pub fn c_strides(shape: &[usize], itemsize: usize) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(0, shape.len());
    let mut step = itemsize as isize;
    for (stride, &dim) in strides.iter_mut().zip(shape).rev() {
        *stride = step;
        step *= dim.max(1) as isize;
    }
    strides
}

/// Column-major byte strides (first index varies fastest).
pub fn f_strides(shape: &[usize], itemsize: usize) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(0, shape.len());
    let mut step = itemsize as isize;
    for (stride, &dim) in strides.iter_mut().zip(shape) {
        *stride = step;
        step *= dim.max(1) as isize;
    }
    strides
}

/// Byte strides of a fresh allocation in `order`.
pub fn order_strides(shape: &[usize], itemsize: usize, order: MemoryOrder) -> Strides {
    match order {
        MemoryOrder::C => c_strides(shape, itemsize),
        MemoryOrder::F => f_strides(shape, itemsize),
    }
}

/// Classify contiguity.
///
/// Axes of extent 1 are ignored, so an array can be both C- and
/// F-contiguous. An empty array is both.
pub fn contiguity(shape: &[usize], strides: &[isize], itemsize: usize) -> ArrayFlags {
    if shape.iter().any(|&d| d == 0) {
        return ArrayFlags::CONTIGUITY;
    }
    let mut flags = ArrayFlags::empty();

    let mut expected = itemsize as isize;
    let mut is_c = true;
    for (&dim, &stride) in shape.iter().zip(strides).rev() {
        if dim != 1 {
            if stride != expected {
                is_c = false;
                break;
            }
            expected *= dim as isize;
        }
    }
    if is_c {
        flags |= ArrayFlags::C_CONTIGUOUS;
    }

    let mut expected = itemsize as isize;
    let mut is_f = true;
    for (&dim, &stride) in shape.iter().zip(strides) {
        if dim != 1 {
            if stride != expected {
                is_f = false;
                break;
            }
            expected *= dim as isize;
        }
    }
    if is_f {
        flags |= ArrayFlags::F_CONTIGUOUS;
    }
    flags
}

/// True iff every stride is an exact multiple of `itemsize`.
///
/// When it holds, element-count addressing (`stride / itemsize`) is exact.
pub fn element_strides_aligned(strides: &[isize], itemsize: usize) -> bool {
    if itemsize == 0 {
        return true;
    }
    strides.iter().all(|&s| s % itemsize as isize == 0)
}

/// Data address and every stride of a non-trivial axis are multiples of
/// `align`.
pub fn is_aligned(data: *const u8, shape: &[usize], strides: &[isize], align: usize) -> bool {
    if align <= 1 {
        return true;
    }
    let align = align as isize;
    (data as usize as isize) % align == 0
        && shape
            .iter()
            .zip(strides)
            .all(|(&d, &s)| d <= 1 || s % align == 0)
}

/// Verify that explicit strides stay inside a buffer.
///
/// For every axis independently, `stride * (dim - 1)` must lie within
/// `[-offset, buffer_bytes - offset - itemsize]`. When `buffer_bytes` is 0 it
/// is taken as `product(dims) * itemsize`. The check looks at each axis on
/// its own and does not bound the combined reach of several axes.
pub fn check_strides(
    itemsize: usize,
    dims: &[usize],
    strides: &[isize],
    buffer_bytes: usize,
    offset: usize,
) -> bool {
    if dims.len() != strides.len() {
        return false;
    }
    let numbytes = if buffer_bytes == 0 {
        match dims
            .iter()
            .try_fold(itemsize, |acc, &d| acc.checked_mul(d))
        {
            Some(n) => n,
            None => return false,
        }
    } else {
        buffer_bytes
    };
    let (Ok(numbytes), Ok(offset), Ok(itemsize)) = (
        isize::try_from(numbytes),
        isize::try_from(offset),
        isize::try_from(itemsize),
    ) else {
        return false;
    };
    let begin = -offset;
    let end = numbytes - offset - itemsize;
    for (&dim, &stride) in dims.iter().zip(strides) {
        let Some(byte_begin) = (dim as isize)
            .checked_sub(1)
            .and_then(|n| stride.checked_mul(n))
        else {
            return false;
        };
        if byte_begin < begin || byte_begin > end {
            return false;
        }
    }
    true
}

/// Lowest and one-past-highest byte offsets reachable from element zero.
///
/// Empty arrays reach nothing and return `(0, 0)`.
pub fn byte_bounds(shape: &[usize], strides: &[isize], itemsize: usize) -> (isize, isize) {
    if shape.iter().any(|&d| d == 0) {
        return (0, 0);
    }
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (&dim, &stride) in shape.iter().zip(strides) {
        let reach = stride * (dim as isize - 1);
        if reach < 0 {
            lo += reach;
        } else {
            hi += reach;
        }
    }
    (lo, hi + itemsize as isize)
}

/// Total element count, `None` on overflow.
pub fn checked_size(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

// ============================================================================
// Layout
// ============================================================================

/// Shape and byte strides of an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
}

impl Layout {
    /// Layout with explicit strides; ranks must agree and the element
    /// count must fit in `usize`.
    pub fn new(shape: &[usize], strides: &[isize]) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(ArrayError::Construction(format!(
                "strides of length {} do not match shape of length {}",
                strides.len(),
                shape.len()
            )));
        }
        if checked_size(shape).is_none() {
            return Err(ArrayError::Construction(format!("array of shape {shape:?} is too big")));
        }
        Ok(Self {
            shape: SmallVec::from_slice(shape),
            strides: SmallVec::from_slice(strides),
        })
    }

    /// Densely packed layout in `order`.
    pub fn contiguous(shape: &[usize], itemsize: usize, order: MemoryOrder) -> Self {
        Self {
            shape: SmallVec::from_slice(shape),
            strides: order_strides(shape, itemsize, order),
        }
    }

    pub(crate) fn from_parts(shape: Shape, strides: Strides) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self { shape, strides }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn size(&self) -> usize {
        checked_size(&self.shape).unwrap_or(0)
    }

    pub fn contiguity(&self, itemsize: usize) -> ArrayFlags {
        contiguity(&self.shape, &self.strides, itemsize)
    }

    pub fn byte_bounds(&self, itemsize: usize) -> (isize, isize) {
        byte_bounds(&self.shape, &self.strides, itemsize)
    }

    /// Byte offset of a multi-index, bounds checked.
    pub fn offset_of(&self, index: &[usize]) -> Result<isize> {
        if index.len() != self.ndim() {
            return Err(ArrayError::RankMismatch {
                expected: self.ndim(),
                found: index.len(),
            });
        }
        let mut offset = 0isize;
        for (axis, ((&i, &dim), &stride)) in index
            .iter()
            .zip(self.shape.iter())
            .zip(self.strides.iter())
            .enumerate()
        {
            if i >= dim {
                return Err(ArrayError::IndexOutOfBounds {
                    axis,
                    index: i,
                    size: dim,
                });
            }
            offset += i as isize * stride;
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_and_f_strides() {
        assert_eq!(c_strides(&[2, 3, 4], 8).as_slice(), &[96, 32, 8]);
        assert_eq!(f_strides(&[2, 3, 4], 8).as_slice(), &[8, 16, 48]);
        assert_eq!(c_strides(&[2, 0, 4], 4).as_slice(), &[16, 16, 4]);
        assert!(c_strides(&[], 8).is_empty());
    }

    #[test]
    fn test_contiguity_classes() {
        let c = contiguity(&[2, 3], &[24, 8], 8);
        assert_eq!(c, ArrayFlags::C_CONTIGUOUS);
        let f = contiguity(&[2, 3], &[8, 16], 8);
        assert_eq!(f, ArrayFlags::F_CONTIGUOUS);
        let neither = contiguity(&[2, 3], &[48, 16], 8);
        assert!(neither.is_empty());
        // Extent-1 axes do not constrain their stride.
        let both = contiguity(&[3, 1], &[8, 999], 8);
        assert_eq!(both, ArrayFlags::CONTIGUITY);
        assert_eq!(contiguity(&[5], &[8], 8), ArrayFlags::CONTIGUITY);
        assert_eq!(contiguity(&[0, 7], &[3, 1], 8), ArrayFlags::CONTIGUITY);
        assert_eq!(contiguity(&[], &[], 8), ArrayFlags::CONTIGUITY);
    }

    #[test]
    fn test_element_strides_aligned() {
        assert!(element_strides_aligned(&[16, -8], 8));
        assert!(!element_strides_aligned(&[12, 8], 8));
        assert!(element_strides_aligned(&[0], 4));
    }

    #[test]
    fn test_check_strides_bounds() {
        // 4 x i32 in a 16-byte buffer.
        assert!(check_strides(4, &[4], &[4], 16, 0));
        assert!(!check_strides(4, &[4], &[4], 15, 0));
        assert!(!check_strides(4, &[4], &[4], 16, 4));
        // Negative stride walking back from the end.
        assert!(check_strides(4, &[4], &[-4], 16, 12));
        assert!(!check_strides(4, &[4], &[-4], 16, 8));
        // Zero buffer size derives from the dims.
        assert!(check_strides(8, &[2, 3], &[24, 8], 0, 0));
        assert!(!check_strides(8, &[2, 3], &[48, 8], 0, 0));
    }

    #[test]
    fn test_check_strides_is_per_axis() {
        // Each axis alone fits; combined reach (8 + 8) exceeds the buffer.
        assert!(check_strides(4, &[2, 2], &[8, 8], 12, 0));
    }

    #[test]
    fn test_byte_bounds() {
        assert_eq!(byte_bounds(&[2, 3], &[24, 8], 8), (0, 48));
        assert_eq!(byte_bounds(&[3], &[-8], 8), (-16, 8));
        assert_eq!(byte_bounds(&[0, 3], &[24, 8], 8), (0, 0));
    }

    #[test]
    fn test_layout_offset_of() {
        let layout = Layout::contiguous(&[2, 3], 4, MemoryOrder::C);
        assert_eq!(layout.offset_of(&[1, 2]).unwrap(), 20);
        assert!(matches!(
            layout.offset_of(&[2, 0]),
            Err(ArrayError::IndexOutOfBounds { axis: 0, index: 2, size: 2 })
        ));
        assert!(matches!(
            layout.offset_of(&[0]),
            Err(ArrayError::RankMismatch { expected: 2, found: 1 })
        ));
        assert!(Layout::new(&[2], &[8, 8]).is_err());
    }

    #[test]
    fn test_layout_rejects_oversized_shape() {
        assert!(matches!(
            Layout::new(&[usize::MAX, 2], &[0, 0]),
            Err(ArrayError::Construction(_))
        ));
        assert!(matches!(
            Layout::new(&[1 << 33, 1 << 33], &[0, 0]),
            Err(ArrayError::Construction(_))
        ));
        assert_eq!(Layout::new(&[usize::MAX, 2, 0], &[0, 0, 0]).unwrap().size(), 0);
    }
}
