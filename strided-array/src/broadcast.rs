//! Broadcasting and lock-step iteration over several arrays.
//!
//! Shapes are right-aligned; on every axis the non-1 extents must agree and
//! the common extent is their maximum. Each input is padded on the left with
//! stride-0 axes and gets stride 0 on every axis it stretches, so broadcast
//! axes never advance a pointer. Positions are visited in row-major order of
//! the common shape by linear advance with carry.

use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::layout::{checked_size, Shape, Strides};
use crate::{Array, ArrayError, Result};

/// Common broadcast shape of `shapes`.
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];
    // Index of the shape that fixed each output axis, for error reporting.
    let mut source: Vec<Option<usize>> = vec![None; ndim];
    for (which, shape) in shapes.iter().enumerate() {
        let pad = ndim - shape.len();
        for (j, &dim) in shape.iter().enumerate() {
            let axis = pad + j;
            if dim == 1 {
                continue;
            }
            match source[axis] {
                None => {
                    out[axis] = dim;
                    source[axis] = Some(which);
                }
                Some(_) if out[axis] == dim => {}
                Some(prev) => {
                    return Err(ArrayError::ShapeMismatch(
                        shapes[prev].to_vec(),
                        shape.to_vec(),
                    ))
                }
            }
        }
    }
    Ok(out)
}

/// Strides of a `shape`/`strides` operand stretched to `target`.
fn stretch_strides(shape: &[usize], strides: &[isize], target: &[usize]) -> Option<Strides> {
    if shape.len() > target.len() {
        return None;
    }
    let pad = target.len() - shape.len();
    let mut out: Strides = SmallVec::from_elem(0, target.len());
    for (j, (&dim, &stride)) in shape.iter().zip(strides).enumerate() {
        let want = target[pad + j];
        if dim == want {
            out[pad + j] = if dim == 1 { 0 } else { stride };
        } else if dim != 1 {
            return None;
        }
    }
    Some(out)
}

// ============================================================================
// Operands
// ============================================================================

/// Raw description of one iteration input.
#[derive(Debug, Clone)]
pub(crate) struct IterOperand {
    pub(crate) data: *mut u8,
    pub(crate) shape: Shape,
    pub(crate) strides: Strides,
    pub(crate) mask: Option<(*mut u8, Strides)>,
}

impl IterOperand {
    pub(crate) fn plain(data: *mut u8, shape: &[usize], strides: &[isize]) -> Self {
        Self {
            data,
            shape: SmallVec::from_slice(shape),
            strides: SmallVec::from_slice(strides),
            mask: None,
        }
    }
}

// ============================================================================
// MultiIter
// ============================================================================

/// Lock-step element pointers over several broadcast arrays.
///
/// `next` is a lending iterator: it yields one data pointer per input for
/// each of the `size()` positions of the common shape, in row-major order.
/// Masked inputs also expose their mask byte through
/// [`MultiIter::mask_ptr`].
pub struct MultiIter<'a> {
    shape: Shape,
    size: usize,
    /// Linear position of the current pointers; `size` once exhausted.
    pos: usize,
    started: bool,
    coords: Shape,
    starts: SmallVec<[*mut u8; 4]>,
    ptrs: SmallVec<[*mut u8; 4]>,
    strides: SmallVec<[Strides; 4]>,
    mask_starts: SmallVec<[Option<*mut u8>; 4]>,
    mask_ptrs: SmallVec<[Option<*mut u8>; 4]>,
    mask_strides: SmallVec<[Strides; 4]>,
    _marker: PhantomData<&'a Array>,
}

impl<'a> MultiIter<'a> {
    /// Iterate `arrays` over their common broadcast shape.
    pub fn new(arrays: &[&'a Array]) -> Result<Self> {
        let shapes: Vec<Vec<usize>> = arrays.iter().map(|a| a.shape()).collect();
        let refs: Vec<&[usize]> = shapes.iter().map(|s| s.as_slice()).collect();
        let shape = broadcast_shapes(&refs)?;
        Self::with_shape(arrays, &shape)
    }

    /// Iterate `arrays` stretched to an explicit `shape`.
    pub fn with_shape(arrays: &[&'a Array], shape: &[usize]) -> Result<Self> {
        let ops: Vec<IterOperand> = arrays.iter().map(|a| a.obj.operand()).collect();
        Self::from_operands(&ops, shape)
    }

    pub(crate) fn from_operands(ops: &[IterOperand], shape: &[usize]) -> Result<Self> {
        let mismatch = |op: &IterOperand| ArrayError::ShapeMismatch(op.shape.to_vec(), shape.to_vec());
        let mut strides = SmallVec::with_capacity(ops.len());
        let mut mask_strides = SmallVec::with_capacity(ops.len());
        let mut mask_starts = SmallVec::with_capacity(ops.len());
        for op in ops {
            strides.push(stretch_strides(&op.shape, &op.strides, shape).ok_or_else(|| mismatch(op))?);
            match &op.mask {
                Some((data, ms)) => {
                    mask_strides.push(stretch_strides(&op.shape, ms, shape).ok_or_else(|| mismatch(op))?);
                    mask_starts.push(Some(*data));
                }
                None => {
                    mask_strides.push(SmallVec::new());
                    mask_starts.push(None);
                }
            }
        }
        let size = checked_size(shape)
            .ok_or_else(|| ArrayError::Construction(format!("broadcast shape {shape:?} is too big")))?;
        let starts: SmallVec<[*mut u8; 4]> = ops.iter().map(|op| op.data).collect();
        Ok(Self {
            shape: SmallVec::from_slice(shape),
            size,
            pos: 0,
            started: false,
            coords: SmallVec::from_elem(0, shape.len()),
            ptrs: starts.clone(),
            starts,
            strides,
            mask_ptrs: mask_starts.clone(),
            mask_starts,
            mask_strides,
            _marker: PhantomData,
        })
    }

    /// Pointers of the next position, `None` once all positions are visited.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&[*mut u8]> {
        if !self.started {
            self.started = true;
            if self.size == 0 {
                return None;
            }
            return Some(&self.ptrs);
        }
        if self.pos + 1 >= self.size {
            self.pos = self.size;
            return None;
        }
        self.advance();
        self.pos += 1;
        Some(&self.ptrs)
    }

    /// Linear advance with carry; never called past the last position.
    fn advance(&mut self) {
        for axis in (0..self.shape.len()).rev() {
            let dim = self.shape[axis];
            self.coords[axis] += 1;
            if self.coords[axis] < dim {
                for (ptr, strides) in self.ptrs.iter_mut().zip(&self.strides) {
                    *ptr = ptr.wrapping_offset(strides[axis]);
                }
                for (ptr, strides) in self.mask_ptrs.iter_mut().zip(&self.mask_strides) {
                    if let Some(p) = ptr {
                        *p = p.wrapping_offset(strides[axis]);
                    }
                }
                return;
            }
            // Rewind this axis and carry into the next slower one.
            self.coords[axis] = 0;
            let back = (dim as isize) - 1;
            for (ptr, strides) in self.ptrs.iter_mut().zip(&self.strides) {
                *ptr = ptr.wrapping_offset(-strides[axis] * back);
            }
            for (ptr, strides) in self.mask_ptrs.iter_mut().zip(&self.mask_strides) {
                if let Some(p) = ptr {
                    *p = p.wrapping_offset(-strides[axis] * back);
                }
            }
        }
    }

    /// Mask byte of input `i` at the current position.
    #[inline]
    pub fn mask_ptr(&self, i: usize) -> Option<*mut u8> {
        self.mask_ptrs[i]
    }

    /// Validity of input `i` at the current position.
    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        match self.mask_ptrs[i] {
            Some(p) => unsafe { *p != 0 },
            None => true,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn num_operands(&self) -> usize {
        self.starts.len()
    }

    /// Linear row-major position of the current pointers.
    #[inline]
    pub fn index(&self) -> usize {
        self.pos
    }

    /// Multi-index of the current position.
    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.coords
    }

    /// Rewind to before the first position.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.started = false;
        self.coords.iter_mut().for_each(|c| *c = 0);
        self.ptrs.clone_from(&self.starts);
        self.mask_ptrs.clone_from(&self.mask_starts);
    }
}
