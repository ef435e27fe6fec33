//! Optional per-element validity mask.
//!
//! A mask is a `u8` sidecar with the array's shape: `1` marks a valid
//! element, `0` a missing one. Ownership is independent of data ownership;
//! views share their source's mask until they allocate their own.

use std::sync::Arc;

use crate::alloc::Buffer;
use crate::broadcast::{IterOperand, MultiIter};
use crate::config::ArrayConfig;
use crate::flags::{ArrayFlags, MemoryOrder};
use crate::layout::{self, Strides};
use crate::{Array, ArrayError, Result};

pub(crate) struct Mask {
    pub(crate) data: *mut u8,
    pub(crate) strides: Strides,
    storage: Option<Buffer>,
}

impl Mask {
    pub(crate) fn borrowed(data: *mut u8, strides: Strides) -> Self {
        Self {
            data,
            strides,
            storage: None,
        }
    }

    /// Fresh contiguous mask in `order` with every element set to `valid`.
    pub(crate) fn owned(
        config: &Arc<ArrayConfig>,
        shape: &[usize],
        valid: bool,
        order: MemoryOrder,
    ) -> Result<Self> {
        let size = layout::checked_size(shape)
            .ok_or_else(|| ArrayError::Construction(format!("mask of shape {shape:?} is too big")))?;
        let storage = Buffer::zeroed(config.allocator(), size, 1)?;
        if valid && size > 0 {
            unsafe { std::ptr::write_bytes(storage.as_ptr(), 1, size) };
        }
        Ok(Self {
            data: storage.as_ptr(),
            strides: layout::order_strides(shape, 1, order),
            storage: Some(storage),
        })
    }

    /// Owned copy of this mask's values laid out contiguously in `order`.
    pub(crate) fn repacked(
        &self,
        config: &Arc<ArrayConfig>,
        shape: &[usize],
        order: MemoryOrder,
    ) -> Result<Self> {
        let fresh = Self::owned(config, shape, true, order)?;
        let ops = [
            IterOperand::plain(fresh.data, shape, &fresh.strides),
            IterOperand::plain(self.data, shape, &self.strides),
        ];
        let mut iter = MultiIter::from_operands(&ops, shape)?;
        while let Some(ptrs) = iter.next() {
            unsafe { *ptrs[0] = *ptrs[1] };
        }
        Ok(fresh)
    }

    #[inline]
    pub(crate) fn is_owned(&self) -> bool {
        self.storage.is_some()
    }

    /// Pointer to the mask byte of an already bounds-checked index.
    pub(crate) fn element_ptr(&self, index: &[usize]) -> *mut u8 {
        let offset: isize = index
            .iter()
            .zip(self.strides.iter())
            .map(|(&i, &s)| i as isize * s)
            .sum();
        self.data.wrapping_offset(offset)
    }
}

impl Array {
    /// Attach an owned validity mask.
    ///
    /// Does nothing when the array already owns one. A borrowed mask is
    /// replaced by an owned copy of its values; otherwise every element
    /// starts as `default_valid`. The mask follows the array's order when it
    /// is only F-contiguous.
    pub fn allocate_mask(&self, default_valid: bool) -> Result<()> {
        let shape = self.shape();
        let flags = self.flags();
        let f_only = flags.contains(ArrayFlags::F_CONTIGUOUS) && !flags.contains(ArrayFlags::C_CONTIGUOUS);
        let order = if f_only {
            MemoryOrder::F
        } else {
            MemoryOrder::C
        };
        let fresh = match self.obj.mask.borrow().as_ref() {
            Some(mask) if mask.is_owned() => return Ok(()),
            Some(mask) => Some(mask.repacked(self.config(), &shape, order)?),
            None => None,
        };
        let copied = fresh.is_some();
        let fresh = match fresh {
            Some(fresh) => fresh,
            None => Mask::owned(self.config(), &shape, default_valid, order)?,
        };
        tracing::trace!(shape = ?shape, copied, "allocated validity mask");
        *self.obj.mask.borrow_mut() = Some(fresh);
        self.obj.refresh_flags();
        Ok(())
    }

    pub fn has_mask(&self) -> bool {
        self.obj.mask.borrow().is_some()
    }

    pub fn owns_mask(&self) -> bool {
        self.obj
            .mask
            .borrow()
            .as_ref()
            .map_or(false, Mask::is_owned)
    }

    /// Whether the element at `index` is valid. Unmasked arrays are valid
    /// everywhere.
    pub fn is_valid(&self, index: &[usize]) -> Result<bool> {
        self.obj.layout.borrow().offset_of(index)?;
        Ok(match self.obj.mask.borrow().as_ref() {
            Some(mask) => unsafe { *mask.element_ptr(index) != 0 },
            None => true,
        })
    }

    /// Mark the element at `index` valid or missing.
    pub fn set_valid(&self, index: &[usize], valid: bool) -> Result<()> {
        if !self.is_writeable() {
            return Err(ArrayError::NotWriteable);
        }
        self.obj.layout.borrow().offset_of(index)?;
        match self.obj.mask.borrow().as_ref() {
            Some(mask) => {
                unsafe { *mask.element_ptr(index) = valid as u8 };
                Ok(())
            }
            None => Err(ArrayError::MaskNotPresent),
        }
    }

    /// Mask values in row-major order, `None` when unmasked.
    pub fn mask_values(&self) -> Option<Vec<bool>> {
        if !self.has_mask() {
            return None;
        }
        let mut out = Vec::with_capacity(self.size());
        let mut iter = MultiIter::new(&[self]).ok()?;
        while iter.next().is_some() {
            out.push(iter.is_valid(0));
        }
        Some(out)
    }

    /// Number of missing elements.
    pub fn count_missing(&self) -> usize {
        self.mask_values()
            .map_or(0, |values| values.iter().filter(|&&v| !v).count())
    }
}
