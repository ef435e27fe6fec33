//! The array object: layout, ownership, flags and element access.
//!
//! An [`Array`] is a cheap handle; cloning it shares the same underlying
//! array object, and handle identity is entity identity. The object is
//! destroyed when its last handle (including handles held as a [`Base`])
//! goes away.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use strided_dtype::{DType, KindRegistry, Scalar};

use crate::alloc::Buffer;
use crate::base::{Base, ForeignBuffer};
use crate::broadcast::{IterOperand, MultiIter};
use crate::config::ArrayConfig;
use crate::copy::copy_operands;
use crate::flags::{ArrayFlags, MemoryOrder};
use crate::layout::{self, checked_size, Layout};
use crate::mask::Mask;
use crate::{ArrayError, Result};

/// Handle to a strided array.
#[derive(Clone)]
pub struct Array {
    pub(crate) obj: Rc<ArrayObject>,
}

pub(crate) struct ArrayObject {
    pub(crate) config: Arc<ArrayConfig>,
    pub(crate) dtype: DType,
    pub(crate) layout: RefCell<Layout>,
    pub(crate) data: *mut u8,
    pub(crate) flags: Cell<ArrayFlags>,
    /// Set while a deferred write-back view holds this array's write lease.
    pub(crate) leased: Cell<bool>,
    /// Memory this object allocated. Present for owning arrays and for
    /// deferred write-back scratch copies.
    pub(crate) storage: Option<Buffer>,
    pub(crate) mask: RefCell<Option<Mask>>,
    pub(crate) base: RefCell<Option<Base>>,
}

impl ArrayObject {
    pub(crate) fn new(
        config: Arc<ArrayConfig>,
        dtype: DType,
        layout: Layout,
        data: *mut u8,
        storage: Option<Buffer>,
        flags: ArrayFlags,
        mask: Option<Mask>,
    ) -> Self {
        let obj = Self {
            config,
            dtype,
            layout: RefCell::new(layout),
            data,
            flags: Cell::new(flags),
            leased: Cell::new(false),
            storage,
            mask: RefCell::new(mask),
            base: RefCell::new(None),
        };
        obj.refresh_flags();
        obj
    }

    /// Recompute the contiguity, alignment and mask bits.
    pub(crate) fn refresh_flags(&self) {
        let layout = self.layout.borrow();
        let derived = ArrayFlags::CONTIGUITY | ArrayFlags::ALIGNED | ArrayFlags::HAS_MASK | ArrayFlags::OWN_MASK;
        let mut flags = self.flags.get() - derived;
        flags |= layout.contiguity(self.dtype.itemsize());
        if layout::is_aligned(
            self.data,
            layout.shape(),
            layout.strides(),
            self.dtype.alignment(),
        ) {
            flags |= ArrayFlags::ALIGNED;
        }
        if let Some(mask) = self.mask.borrow().as_ref() {
            flags |= ArrayFlags::HAS_MASK;
            if mask.is_owned() {
                flags |= ArrayFlags::OWN_MASK;
            }
        }
        self.flags.set(flags);
    }

    pub(crate) fn operand(&self) -> IterOperand {
        let layout = self.layout.borrow();
        IterOperand {
            data: self.data,
            shape: layout.shape().into(),
            strides: layout.strides().into(),
            mask: self
                .mask
                .borrow()
                .as_ref()
                .map(|m| (m.data, m.strides.clone())),
        }
    }

    /// Push the contents back into the write-back target.
    ///
    /// Runs during destruction; failures go to the diagnostic sink.
    fn resolve_writeback(&self) {
        let target = self.base.borrow().as_ref().and_then(|b| b.as_array().cloned());
        if let Some(target) = target {
            target.obj.leased.set(false);
            target
                .obj
                .flags
                .set(target.obj.flags.get() | ArrayFlags::WRITEABLE);
            tracing::trace!(shape = ?target.shape(), "resolving deferred write-back");
            let result = copy_operands(
                &self.config,
                &target.obj.dtype,
                &target.obj.operand(),
                &self.dtype,
                &self.operand(),
            );
            if let Err(err) = result {
                self.config.sink().report(&err);
            }
        }
        self.flags
            .set(self.flags.get() - ArrayFlags::DEFERRED_WRITEBACK);
    }
}

impl Drop for ArrayObject {
    fn drop(&mut self) {
        if self.flags.get().contains(ArrayFlags::DEFERRED_WRITEBACK) {
            self.resolve_writeback();
        }
        if let Some(storage) = self.storage.take() {
            let registry = self.config.registry();
            if registry.has_references(&self.dtype) {
                let itemsize = self.dtype.itemsize();
                for i in 0..storage.len() / itemsize {
                    unsafe { registry.release_item(&self.dtype, storage.as_ptr().add(i * itemsize)) };
                }
            }
            drop(storage);
        }
        self.mask.get_mut().take();
        self.base.get_mut().take();
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Array {
    pub(crate) fn from_object(obj: ArrayObject) -> Self {
        Self { obj: Rc::new(obj) }
    }

    /// Fresh zero-filled array owning its data.
    ///
    /// Generic-reference elements start as the absent value.
    pub fn zeros(dtype: DType, shape: &[usize], order: MemoryOrder) -> Result<Array> {
        Self::zeros_in(&ArrayConfig::shared(), dtype, shape, order)
    }

    /// [`Array::zeros`] with an explicit configuration.
    pub fn zeros_in(
        config: &Arc<ArrayConfig>,
        dtype: DType,
        shape: &[usize],
        order: MemoryOrder,
    ) -> Result<Array> {
        let bytes = checked_size(shape)
            .and_then(|n| n.checked_mul(dtype.itemsize()))
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or_else(|| ArrayError::Construction(format!("array of shape {shape:?} is too big")))?;
        let storage = Buffer::zeroed(config.allocator(), bytes, dtype.alignment())?;
        let layout = Layout::contiguous(shape, dtype.itemsize(), order);
        let data = storage.as_ptr();
        Ok(Self::from_object(ArrayObject::new(
            Arc::clone(config),
            dtype,
            layout,
            data,
            Some(storage),
            ArrayFlags::OWN_DATA | ArrayFlags::WRITEABLE,
            None,
        )))
    }

    /// C-ordered array filled from `values` in row-major order.
    pub fn from_scalars(dtype: DType, shape: &[usize], values: &[Scalar]) -> Result<Array> {
        let out = Self::zeros(dtype, shape, MemoryOrder::C)?;
        if values.len() != out.size() {
            return Err(ArrayError::Construction(format!(
                "{} values cannot fill an array of shape {shape:?}",
                values.len()
            )));
        }
        {
            let registry = out.registry();
            let itemsize = out.itemsize();
            let mut iter = MultiIter::new(&[&out])?;
            let mut values = values.iter();
            while let (Some(ptrs), Some(value)) = (iter.next(), values.next()) {
                let bytes = unsafe { std::slice::from_raw_parts_mut(ptrs[0], itemsize) };
                registry.set_value(out.dtype(), bytes, value)?;
            }
        }
        Ok(out)
    }

    /// Array over externally provided bytes.
    ///
    /// With explicit `strides`, their length must equal the shape's and they
    /// must pass [`layout::check_strides`] against the buffer. Without, the
    /// buffer must hold `offset + itemsize * size` bytes and the array is
    /// C-ordered. Dtypes holding counted references are refused.
    pub fn from_buffer(
        buffer: &Rc<ForeignBuffer>,
        dtype: DType,
        shape: &[usize],
        strides: Option<&[isize]>,
        offset: usize,
    ) -> Result<Array> {
        Self::from_buffer_in(&ArrayConfig::shared(), buffer, dtype, shape, strides, offset)
    }

    /// [`Array::from_buffer`] with an explicit configuration.
    pub fn from_buffer_in(
        config: &Arc<ArrayConfig>,
        buffer: &Rc<ForeignBuffer>,
        dtype: DType,
        shape: &[usize],
        strides: Option<&[isize]>,
        offset: usize,
    ) -> Result<Array> {
        if config.registry().has_references(&dtype) {
            return Err(ArrayError::Construction(
                "cannot create an object array from a memory buffer".to_string(),
            ));
        }
        if offset > buffer.len() {
            return Err(ArrayError::Construction(format!(
                "offset {offset} is past the end of a {}-byte buffer",
                buffer.len()
            )));
        }
        let layout = match strides {
            Some(strides) => {
                if strides.len() != shape.len() {
                    return Err(ArrayError::Construction(
                        "strides, if given, must be the same length as shape".to_string(),
                    ));
                }
                if !layout::check_strides(dtype.itemsize(), shape, strides, buffer.len(), offset) {
                    return Err(ArrayError::Construction(
                        "strides are incompatible with shape of requested array and size of buffer"
                            .to_string(),
                    ));
                }
                Layout::new(shape, strides)?
            }
            None => {
                let needed = checked_size(shape)
                    .and_then(|n| n.checked_mul(dtype.itemsize()))
                    .and_then(|n| n.checked_add(offset));
                match needed {
                    Some(n) if n <= buffer.len() => {}
                    _ => {
                        return Err(ArrayError::Construction(
                            "buffer is too small for requested array".to_string(),
                        ))
                    }
                }
                Layout::contiguous(shape, dtype.itemsize(), MemoryOrder::C)
            }
        };
        let mut flags = ArrayFlags::empty();
        if buffer.is_writeable() {
            flags |= ArrayFlags::WRITEABLE;
        }
        let data = buffer.as_ptr().wrapping_add(offset);
        let out = Self::from_object(ArrayObject::new(
            Arc::clone(config),
            dtype,
            layout,
            data,
            None,
            flags,
            None,
        ));
        out.set_base(Some(Base::Buffer(Rc::clone(buffer))))?;
        Ok(out)
    }

    /// One-dimensional array over the rest of `buffer` after `offset`.
    pub fn from_buffer_infer(buffer: &Rc<ForeignBuffer>, dtype: DType, offset: usize) -> Result<Array> {
        if dtype.itemsize() == 0 {
            return Err(ArrayError::Construction(
                "cannot infer the length of zero-sized elements".to_string(),
            ));
        }
        let remaining = buffer.len().checked_sub(offset).ok_or_else(|| {
            ArrayError::Construction(format!(
                "offset {offset} is past the end of a {}-byte buffer",
                buffer.len()
            ))
        })?;
        if remaining % dtype.itemsize() != 0 {
            return Err(ArrayError::Construction(
                "buffer size must be a multiple of element size".to_string(),
            ));
        }
        let count = remaining / dtype.itemsize();
        Self::from_buffer(buffer, dtype, &[count], None, offset)
    }

    /// Borrowed array over caller-managed memory, with no base.
    ///
    /// # Safety
    /// `data` must stay valid for every element reachable through
    /// `shape`/`strides` for the whole lifetime of the returned array and
    /// all views derived from it, and must not be written through other
    /// aliases while `writeable` arrays over it are in use.
    pub unsafe fn from_raw_parts(
        config: Arc<ArrayConfig>,
        data: *mut u8,
        dtype: DType,
        shape: &[usize],
        strides: &[isize],
        writeable: bool,
    ) -> Result<Array> {
        let layout = Layout::new(shape, strides)?;
        let flags = if writeable {
            ArrayFlags::WRITEABLE
        } else {
            ArrayFlags::empty()
        };
        Ok(Self::from_object(ArrayObject::new(
            config, dtype, layout, data, None, flags, None,
        )))
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Array {
    #[inline]
    pub fn dtype(&self) -> &DType {
        &self.obj.dtype
    }

    #[inline]
    pub fn itemsize(&self) -> usize {
        self.obj.dtype.itemsize()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.obj.layout.borrow().shape().to_vec()
    }

    /// Byte strides.
    pub fn strides(&self) -> Vec<isize> {
        self.obj.layout.borrow().strides().to_vec()
    }

    pub fn layout(&self) -> Layout {
        self.obj.layout.borrow().clone()
    }

    pub fn ndim(&self) -> usize {
        self.obj.layout.borrow().ndim()
    }

    pub fn size(&self) -> usize {
        self.obj.layout.borrow().size()
    }

    pub fn nbytes(&self) -> usize {
        self.size() * self.itemsize()
    }

    #[inline]
    pub fn flags(&self) -> ArrayFlags {
        self.obj.flags.get()
    }

    #[inline]
    pub fn is_writeable(&self) -> bool {
        self.flags().contains(ArrayFlags::WRITEABLE)
    }

    #[inline]
    pub fn owns_data(&self) -> bool {
        self.flags().contains(ArrayFlags::OWN_DATA)
    }

    #[inline]
    pub fn is_c_contiguous(&self) -> bool {
        self.flags().contains(ArrayFlags::C_CONTIGUOUS)
    }

    #[inline]
    pub fn is_f_contiguous(&self) -> bool {
        self.flags().contains(ArrayFlags::F_CONTIGUOUS)
    }

    #[inline]
    pub fn is_deferred_writeback(&self) -> bool {
        self.flags().contains(ArrayFlags::DEFERRED_WRITEBACK)
    }

    pub fn base(&self) -> Option<Base> {
        self.obj.base.borrow().clone()
    }

    #[inline]
    pub fn config(&self) -> &Arc<ArrayConfig> {
        &self.obj.config
    }

    #[inline]
    pub fn registry(&self) -> &KindRegistry {
        self.obj.config.registry()
    }

    /// Address of element zero.
    #[inline]
    pub fn data_ptr(&self) -> *mut u8 {
        self.obj.data
    }

    /// Whether two handles refer to the same array.
    #[inline]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.obj, &other.obj)
    }

    /// Number of live handles, including those held as bases.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.obj)
    }

    /// Whether this object holds the memory its data points into.
    pub(crate) fn holds_storage(&self) -> bool {
        self.obj.storage.is_some()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("dtype", &self.obj.dtype)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("flags", &self.flags())
            .finish()
    }
}

// ============================================================================
// Ownership
// ============================================================================

impl Array {
    /// Bind the memory owner of this array, once.
    ///
    /// A chain of views is collapsed first: while the candidate is another
    /// array, walk to its own base unless the candidate owns its data, or
    /// this array borrows its mask while the candidate owns one, or the
    /// candidate has no base. A chain that resolves back to this array is
    /// rejected and leaves the base unset.
    pub fn set_base(&self, base: Option<Base>) -> Result<()> {
        let Some(mut candidate) = base else {
            return Err(ArrayError::InvalidBase("cannot set the base to nothing"));
        };
        if self.obj.base.borrow().is_some() {
            return Err(ArrayError::AlreadyBound);
        }
        if self.holds_storage() {
            return Err(ArrayError::InvalidBase(
                "an array that owns its data cannot depend on a base",
            ));
        }
        loop {
            let next = match &candidate {
                Base::Array(owner) if !owner.ptr_eq(self) => {
                    if owner.owns_data() || owner.holds_storage() {
                        break;
                    }
                    if !self.owns_mask() && owner.owns_mask() {
                        break;
                    }
                    match owner.base() {
                        Some(next) => next,
                        None => break,
                    }
                }
                _ => break,
            };
            tracing::trace!("collapsing base chain");
            candidate = next;
        }
        if let Base::Array(owner) = &candidate {
            if owner.ptr_eq(self) {
                return Err(ArrayError::CircularBase);
            }
        }
        *self.obj.base.borrow_mut() = Some(candidate);
        Ok(())
    }

    /// Toggle writability.
    ///
    /// Clearing always succeeds. Setting requires that the array is not
    /// leased to a deferred write-back view and that its memory owner is
    /// writeable.
    pub fn set_writeable(&self, writeable: bool) -> Result<()> {
        let flags = self.flags();
        if !writeable {
            self.obj.flags.set(flags - ArrayFlags::WRITEABLE);
            return Ok(());
        }
        if self.obj.leased.get() {
            return Err(ArrayError::NotWriteable);
        }
        let allowed = self.holds_storage()
            || match self.obj.base.borrow().as_ref() {
                Some(base) => base.is_writeable(),
                None => true,
            };
        if !allowed {
            return Err(ArrayError::NotWriteable);
        }
        self.obj.flags.set(flags | ArrayFlags::WRITEABLE);
        Ok(())
    }

    /// Give a contiguous array a new shape with the same element count.
    ///
    /// Contiguity flags and mask strides are recomputed.
    pub fn reshape_in_place(&self, shape: &[usize], order: MemoryOrder) -> Result<()> {
        if self.is_deferred_writeback() {
            return Err(ArrayError::Construction(
                "cannot reshape an array with a pending write-back".to_string(),
            ));
        }
        let old_shape = self.shape();
        if checked_size(shape) != Some(self.size()) {
            return Err(ArrayError::Construction(format!(
                "cannot reshape array of shape {old_shape:?} into shape {shape:?}"
            )));
        }
        let needed = match order {
            MemoryOrder::C => ArrayFlags::C_CONTIGUOUS,
            MemoryOrder::F => ArrayFlags::F_CONTIGUOUS,
        };
        if !self.flags().contains(needed) {
            return Err(ArrayError::Construction(format!(
                "array is not {order:?}-contiguous and cannot be reshaped in place"
            )));
        }
        {
            let mut mask = self.obj.mask.borrow_mut();
            if let Some(current) = mask.as_mut() {
                if !layout::contiguity(&old_shape, &current.strides, 1).contains(needed) {
                    return Err(ArrayError::Construction(
                        "validity mask is not contiguous and cannot be reshaped in place"
                            .to_string(),
                    ));
                }
                current.strides = layout::order_strides(shape, 1, order);
            }
        }
        *self.obj.layout.borrow_mut() = Layout::contiguous(shape, self.itemsize(), order);
        self.obj.refresh_flags();
        Ok(())
    }
}

// ============================================================================
// Element access
// ============================================================================

impl Array {
    fn element_ptr(&self, index: &[usize]) -> Result<*mut u8> {
        let offset = self.obj.layout.borrow().offset_of(index)?;
        Ok(self.obj.data.wrapping_offset(offset))
    }

    /// Stored value at `index`. Masked-out elements still report their
    /// underlying data; see [`Array::is_valid`].
    pub fn get(&self, index: &[usize]) -> Result<Scalar> {
        let ptr = self.element_ptr(index)?;
        let bytes = unsafe { std::slice::from_raw_parts(ptr, self.itemsize()) };
        Ok(self.registry().get_value(self.dtype(), bytes)?)
    }

    /// Store `value` at `index` and mark the element valid.
    pub fn set(&self, index: &[usize], value: &Scalar) -> Result<()> {
        if !self.is_writeable() {
            return Err(ArrayError::NotWriteable);
        }
        let ptr = self.element_ptr(index)?;
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr, self.itemsize()) };
        self.registry().set_value(self.dtype(), bytes, value)?;
        if let Some(mask) = self.obj.mask.borrow().as_ref() {
            unsafe { *mask.element_ptr(index) = 1 };
        }
        Ok(())
    }

    /// Store `value` into every element and mark them all valid.
    pub fn assign_scalar(&self, value: &Scalar) -> Result<()> {
        if !self.is_writeable() {
            return Err(ArrayError::NotWriteable);
        }
        let registry = self.registry();
        let itemsize = self.itemsize();
        let mut iter = MultiIter::new(&[self])?;
        while let Some(ptrs) = iter.next() {
            let bytes = unsafe { std::slice::from_raw_parts_mut(ptrs[0], itemsize) };
            registry.set_value(self.dtype(), bytes, value)?;
            if let Some(m) = iter.mask_ptr(0) {
                unsafe { *m = 1 };
            }
        }
        Ok(())
    }

    /// Every element value in row-major logical order.
    pub fn to_scalars(&self) -> Result<Vec<Scalar>> {
        let registry = self.registry();
        let itemsize = self.itemsize();
        let mut out = Vec::with_capacity(self.size());
        let mut iter = MultiIter::new(&[self])?;
        while let Some(ptrs) = iter.next() {
            let bytes = unsafe { std::slice::from_raw_parts(ptrs[0], itemsize) };
            out.push(registry.get_value(self.dtype(), bytes)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(n: i64, shape: &[usize]) -> Array {
        let values: Vec<Scalar> = (0..n).map(Scalar::Int).collect();
        Array::from_scalars(DType::int64(), shape, &values).unwrap()
    }

    #[test]
    fn test_zeros_flags() {
        let a = Array::zeros(DType::float64(), &[2, 3], MemoryOrder::C).unwrap();
        assert_eq!(a.shape(), vec![2, 3]);
        assert_eq!(a.strides(), vec![24, 8]);
        assert_eq!(a.ndim(), a.strides().len());
        let flags = a.flags();
        assert!(flags.contains(ArrayFlags::OWN_DATA | ArrayFlags::WRITEABLE | ArrayFlags::C_CONTIGUOUS));
        assert!(flags.contains(ArrayFlags::ALIGNED));
        assert!(!flags.contains(ArrayFlags::F_CONTIGUOUS));
        assert!(a.base().is_none());
        assert_eq!(a.get(&[1, 2]).unwrap(), Scalar::Float(0.0));
    }

    #[test]
    fn test_zeros_f_order() {
        let a = Array::zeros(DType::int32(), &[2, 3], MemoryOrder::F).unwrap();
        assert_eq!(a.strides(), vec![4, 8]);
        assert!(a.is_f_contiguous());
    }

    #[test]
    fn test_set_get_and_to_scalars() {
        let a = arange(6, &[2, 3]);
        assert_eq!(a.get(&[1, 0]).unwrap(), Scalar::Int(3));
        a.set(&[1, 0], &Scalar::Int(30)).unwrap();
        assert_eq!(a.to_scalars().unwrap()[3], Scalar::Int(30));
        assert!(matches!(
            a.get(&[2, 0]),
            Err(ArrayError::IndexOutOfBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn test_from_scalars_length_mismatch() {
        let err = Array::from_scalars(DType::int64(), &[2, 2], &[Scalar::Int(1)]);
        assert!(matches!(err, Err(ArrayError::Construction(_))));
    }

    #[test]
    fn test_assign_scalar() {
        let a = Array::zeros(DType::int32(), &[3], MemoryOrder::C).unwrap();
        a.assign_scalar(&Scalar::Int(7)).unwrap();
        assert_eq!(a.to_scalars().unwrap(), vec![Scalar::Int(7); 3]);
    }

    #[test]
    fn test_set_base_rejects_owning_array() {
        let a = arange(3, &[3]);
        let b = arange(3, &[3]);
        assert!(matches!(
            a.set_base(Some(Base::Array(b))),
            Err(ArrayError::InvalidBase(_))
        ));
        assert!(matches!(a.set_base(None), Err(ArrayError::InvalidBase(_))));
    }

    #[test]
    fn test_read_only_set_fails() {
        let a = arange(3, &[3]);
        a.set_writeable(false).unwrap();
        assert!(matches!(a.set(&[0], &Scalar::Int(1)), Err(ArrayError::NotWriteable)));
        a.set_writeable(true).unwrap();
        a.set(&[0], &Scalar::Int(1)).unwrap();
    }

    #[test]
    fn test_reshape_in_place() {
        let a = arange(6, &[2, 3]);
        a.reshape_in_place(&[3, 2], MemoryOrder::C).unwrap();
        assert_eq!(a.shape(), vec![3, 2]);
        assert_eq!(a.strides(), vec![16, 8]);
        assert_eq!(a.get(&[2, 1]).unwrap(), Scalar::Int(5));
        assert!(a.reshape_in_place(&[4], MemoryOrder::C).is_err());
    }

    #[test]
    fn test_reshape_in_place_carries_mask_f_order() {
        let a = Array::zeros(DType::int64(), &[2, 3], MemoryOrder::F).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                a.set(&[i, j], &Scalar::Int((i * 3 + j) as i64)).unwrap();
            }
        }
        a.allocate_mask(true).unwrap();
        a.set_valid(&[1, 0], false).unwrap();
        a.set_valid(&[0, 2], false).unwrap();

        a.reshape_in_place(&[3, 2], MemoryOrder::F).unwrap();
        assert_eq!(a.shape(), vec![3, 2]);
        assert_eq!(a.strides(), vec![8, 24]);
        assert!(a.is_f_contiguous());
        // F linear order 0,3,1,4,2,5 refills the new shape column by column.
        assert_eq!(
            a.to_scalars().unwrap(),
            [0, 4, 3, 2, 1, 5].map(Scalar::Int).to_vec()
        );
        assert_eq!(
            a.mask_values().unwrap(),
            vec![true, true, false, false, true, true]
        );
        assert!(!a.is_valid(&[1, 0]).unwrap());
        assert!(!a.is_valid(&[1, 1]).unwrap());
        assert!(a.is_valid(&[2, 1]).unwrap());

        assert!(matches!(
            a.reshape_in_place(&[6], MemoryOrder::C),
            Err(ArrayError::Construction(_))
        ));
        assert_eq!(a.shape(), vec![3, 2]);
    }

    #[test]
    fn test_object_elements_release_on_drop() {
        let shared = Arc::new(Scalar::from("payload"));
        let a = Array::zeros(DType::object(), &[4], MemoryOrder::C).unwrap();
        assert_eq!(a.get(&[0]).unwrap(), Scalar::None);
        a.assign_scalar(&Scalar::Object(Arc::clone(&shared))).unwrap();
        assert_eq!(Arc::strong_count(&shared), 5);
        drop(a);
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
