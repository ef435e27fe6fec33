//! Memory owners a view can depend on.

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::Array;

/// The entity a view keeps alive for the memory it borrows.
#[derive(Clone)]
pub enum Base {
    Array(Array),
    Buffer(Rc<ForeignBuffer>),
}

impl Base {
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Base::Array(a) => Some(a),
            Base::Buffer(_) => None,
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Base) -> bool {
        match (self, other) {
            (Base::Array(a), Base::Array(b)) => a.ptr_eq(b),
            (Base::Buffer(a), Base::Buffer(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn is_writeable(&self) -> bool {
        match self {
            Base::Array(a) => a.is_writeable(),
            Base::Buffer(b) => b.is_writeable(),
        }
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::Array(a) => f.debug_tuple("Array").field(&a.shape()).finish(),
            Base::Buffer(b) => f.debug_tuple("Buffer").field(&b.len()).finish(),
        }
    }
}

impl From<Array> for Base {
    fn from(a: Array) -> Self {
        Base::Array(a)
    }
}

impl From<Rc<ForeignBuffer>> for Base {
    fn from(b: Rc<ForeignBuffer>) -> Self {
        Base::Buffer(b)
    }
}

// ============================================================================
// ForeignBuffer
// ============================================================================

/// Externally provided bytes that arrays can be built over.
///
/// The bytes live at a fixed address for the buffer's whole lifetime and
/// are only mutated through arrays built over a writeable buffer.
pub struct ForeignBuffer {
    ptr: NonNull<u8>,
    len: usize,
    writeable: bool,
}

impl ForeignBuffer {
    pub fn from_vec(bytes: Vec<u8>, writeable: bool) -> Rc<Self> {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let raw = Box::into_raw(boxed) as *mut u8;
        Rc::new(Self {
            ptr: NonNull::new(raw).unwrap_or(NonNull::dangling()),
            len,
            writeable,
        })
    }

    pub fn from_slice(bytes: &[u8], writeable: bool) -> Rc<Self> {
        Self::from_vec(bytes.to_vec(), writeable)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_writeable(&self) -> bool {
        self.writeable
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Snapshot of the current contents.
    pub fn to_vec(&self) -> Vec<u8> {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }.to_vec()
    }
}

impl Drop for ForeignBuffer {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
        drop(unsafe { Box::from_raw(slice) });
    }
}

impl fmt::Debug for ForeignBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignBuffer")
            .field("len", &self.len)
            .field("writeable", &self.writeable)
            .finish()
    }
}
