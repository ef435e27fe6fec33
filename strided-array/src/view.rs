//! Views: arrays borrowing another array's memory.
//!
//! Every view binds its base through [`Array::set_base`], so chains of views
//! collapse onto the memory owner. A masked source hands its mask to the view
//! as a borrowed mask with the same geometry transform applied.

use std::ops::Range;

use smallvec::SmallVec;
use strided_dtype::DType;

use crate::array::ArrayObject;
use crate::base::Base;
use crate::flags::ArrayFlags;
use crate::layout::{self, Layout, Shape, Strides};
use crate::mask::Mask;
use crate::{Array, ArrayError, Result};

/// New shape, strides and byte offset derived from a source geometry.
type Geometry = (Shape, Strides, isize);

impl Array {
    /// Build a view from a geometry transform applied to both data and mask
    /// strides.
    fn transformed<F>(&self, dtype: DType, writeable: bool, transform: F) -> Result<Array>
    where
        F: Fn(&[usize], &[isize]) -> Geometry,
    {
        let layout = self.layout();
        let (shape, strides, offset) = transform(layout.shape(), layout.strides());
        let mask = self.obj.mask.borrow().as_ref().map(|m| {
            let (_, mstrides, moffset) = transform(layout.shape(), &m.strides);
            Mask::borrowed(m.data.wrapping_offset(moffset), mstrides)
        });
        self.make_view(dtype, Layout::from_parts(shape, strides), offset, mask, writeable)
    }

    fn make_view(
        &self,
        dtype: DType,
        layout: Layout,
        byte_offset: isize,
        mask: Option<Mask>,
        writeable: bool,
    ) -> Result<Array> {
        let flags = if writeable && self.is_writeable() {
            ArrayFlags::WRITEABLE
        } else {
            ArrayFlags::empty()
        };
        let view = Array::from_object(ArrayObject::new(
            self.config().clone(),
            dtype,
            layout,
            self.data_ptr().wrapping_offset(byte_offset),
            None,
            flags,
            mask,
        ));
        view.set_base(Some(Base::Array(self.clone())))?;
        Ok(view)
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(ArrayError::Construction(format!(
                "axis {axis} is out of bounds for array of dimension {ndim}"
            )));
        }
        Ok(())
    }

    /// View of the whole array.
    pub fn view(&self) -> Result<Array> {
        self.transformed(self.dtype().clone(), true, |shape, strides| {
            (SmallVec::from_slice(shape), SmallVec::from_slice(strides), 0)
        })
    }

    /// View with axes reordered so that new axis `i` is old axis `axes[i]`.
    pub fn permute(&self, axes: &[usize]) -> Result<Array> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        if axes.len() != ndim {
            return Err(ArrayError::Construction(format!(
                "permutation of length {} does not match array of dimension {ndim}",
                axes.len()
            )));
        }
        for &ax in axes {
            if ax >= ndim || seen[ax] {
                return Err(ArrayError::Construction(format!(
                    "invalid axis permutation {axes:?}"
                )));
            }
            seen[ax] = true;
        }
        self.transformed(self.dtype().clone(), true, |shape, strides| {
            (
                axes.iter().map(|&ax| shape[ax]).collect(),
                axes.iter().map(|&ax| strides[ax]).collect(),
                0,
            )
        })
    }

    /// View with the axis order reversed.
    pub fn transpose(&self) -> Result<Array> {
        let axes: Vec<usize> = (0..self.ndim()).rev().collect();
        self.permute(&axes)
    }

    /// View of `range` along `axis`, taking every `step`-th element.
    ///
    /// A negative step walks the range backwards from its last element.
    pub fn slice_axis(&self, axis: usize, range: Range<usize>, step: isize) -> Result<Array> {
        self.check_axis(axis)?;
        let dim = self.layout().shape()[axis];
        if range.start > range.end || range.end > dim {
            return Err(ArrayError::IndexOutOfBounds {
                axis,
                index: range.end.max(range.start),
                size: dim,
            });
        }
        if step == 0 {
            return Err(ArrayError::Construction("slice step cannot be zero".to_string()));
        }
        let span = range.end - range.start;
        let abs = step.unsigned_abs();
        let len = (span + abs - 1) / abs;
        let first = match (len, step > 0) {
            (0, _) => 0,
            (_, true) => range.start,
            (_, false) => range.end - 1,
        };
        self.transformed(self.dtype().clone(), true, |shape, strides| {
            let mut new_shape: Shape = SmallVec::from_slice(shape);
            let mut new_strides: Strides = SmallVec::from_slice(strides);
            new_shape[axis] = len;
            new_strides[axis] = strides[axis] * step;
            (new_shape, new_strides, first as isize * strides[axis])
        })
    }

    /// View at `index` along `axis`, dropping that axis.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Array> {
        self.check_axis(axis)?;
        let dim = self.layout().shape()[axis];
        if index >= dim {
            return Err(ArrayError::IndexOutOfBounds {
                axis,
                index,
                size: dim,
            });
        }
        self.transformed(self.dtype().clone(), true, |shape, strides| {
            let mut new_shape: Shape = SmallVec::from_slice(shape);
            let mut new_strides: Strides = SmallVec::from_slice(strides);
            new_shape.remove(axis);
            new_strides.remove(axis);
            (new_shape, new_strides, index as isize * strides[axis])
        })
    }

    /// Read-only view stretched to `shape` with stride-0 broadcast axes.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Array> {
        let src = self.shape();
        let mismatch = || ArrayError::ShapeMismatch(src.clone(), shape.to_vec());
        if src.len() > shape.len() {
            return Err(mismatch());
        }
        let pad = shape.len() - src.len();
        for (j, &dim) in src.iter().enumerate() {
            if dim != shape[pad + j] && dim != 1 {
                return Err(mismatch());
            }
        }
        if layout::checked_size(shape).is_none() {
            return Err(ArrayError::Construction(format!("array of shape {shape:?} is too big")));
        }
        self.transformed(self.dtype().clone(), false, |old_shape, strides| {
            let mut new_strides: Strides = SmallVec::from_elem(0, shape.len());
            for (j, (&dim, &stride)) in old_shape.iter().zip(strides).enumerate() {
                if dim == shape[pad + j] && dim != 1 {
                    new_strides[pad + j] = stride;
                }
            }
            (SmallVec::from_slice(shape), new_strides, 0)
        })
    }

    /// View of one record field.
    ///
    /// `name` may be a field name or title. Array-valued fields append their
    /// shape as trailing C-ordered axes; the mask, if any, is broadcast over
    /// those axes.
    pub fn field(&self, name: &str) -> Result<Array> {
        let field = self
            .dtype()
            .fields()
            .and_then(|f| f.get(name))
            .ok_or_else(|| ArrayError::NoSuchField(name.to_string()))?
            .clone();
        let (base_dtype, sub_shape) = field.dtype.expand();
        let sub_strides = layout::c_strides(&sub_shape, base_dtype.itemsize());

        let layout = self.layout();
        let mut shape: Shape = SmallVec::from_slice(layout.shape());
        let mut strides: Strides = SmallVec::from_slice(layout.strides());
        shape.extend_from_slice(&sub_shape);
        strides.extend_from_slice(&sub_strides);

        let mask = self.obj.mask.borrow().as_ref().map(|m| {
            let mut mstrides = m.strides.clone();
            mstrides.extend(std::iter::repeat(0).take(sub_shape.len()));
            Mask::borrowed(m.data, mstrides)
        });
        self.make_view(
            base_dtype,
            Layout::from_parts(shape, strides),
            field.offset as isize,
            mask,
            true,
        )
    }

    /// View with explicit byte strides over this array's memory.
    ///
    /// The source must be contiguous and unmasked; the new geometry is
    /// validated with [`layout::check_strides`] against the source extent.
    pub fn strided_view(&self, shape: &[usize], strides: &[isize], byte_offset: usize) -> Result<Array> {
        if self.has_mask() {
            return Err(ArrayError::Construction(
                "explicit strides are not supported on masked arrays".to_string(),
            ));
        }
        if !self.flags().intersects(ArrayFlags::CONTIGUITY) {
            return Err(ArrayError::Construction(
                "explicit strides require a contiguous source".to_string(),
            ));
        }
        if strides.len() != shape.len() {
            return Err(ArrayError::Construction(
                "strides, if given, must be the same length as shape".to_string(),
            ));
        }
        let itemsize = self.itemsize();
        if self.registry().has_references(self.dtype())
            && (byte_offset % itemsize != 0 || !layout::element_strides_aligned(strides, itemsize))
        {
            return Err(ArrayError::Construction(
                "object array views must start and step on whole elements".to_string(),
            ));
        }
        let extent = self.nbytes();
        if byte_offset > extent
            || !layout::check_strides(self.itemsize(), shape, strides, extent, byte_offset)
        {
            return Err(ArrayError::Construction(
                "strides are incompatible with shape of requested array and size of source"
                    .to_string(),
            ));
        }
        self.make_view(
            self.dtype().clone(),
            Layout::new(shape, strides)?,
            byte_offset as isize,
            None,
            true,
        )
    }
}
