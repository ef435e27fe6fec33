//! Array flag set and memory orders.

bitflags::bitflags! {
    /// Layout and ownership flags of an array.
    ///
    /// Contiguity bits are recomputed whenever shape or strides change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArrayFlags: u32 {
        const C_CONTIGUOUS = 1 << 0;
        const F_CONTIGUOUS = 1 << 1;
        /// Data address and strides are multiples of the dtype alignment.
        const ALIGNED = 1 << 2;
        const WRITEABLE = 1 << 3;
        /// The array allocated its buffer and has no base.
        const OWN_DATA = 1 << 4;
        /// Contents are copied back into the base on destruction.
        const DEFERRED_WRITEBACK = 1 << 5;
        const HAS_MASK = 1 << 6;
        const OWN_MASK = 1 << 7;
    }
}

impl ArrayFlags {
    /// The contiguity bits only.
    pub const CONTIGUITY: ArrayFlags = ArrayFlags::C_CONTIGUOUS.union(ArrayFlags::F_CONTIGUOUS);
}

/// Memory order of freshly allocated arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryOrder {
    /// Row-major: last index varies fastest.
    #[default]
    C,
    /// Column-major: first index varies fastest.
    F,
}
