//! Kind tags identifying the element capability of a dtype.

/// Kind tag of an element type.
///
/// The tag selects the [`ElementKind`](crate::ElementKind) capability used for
/// `get_value`, `set_value` and `compare_raw`. Records are composed field-wise
/// by the registry and never dispatched to a single capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    UInt,
    Float,
    Complex,
    /// Fixed-width byte string, one `u8` unit per character.
    Bytes,
    /// Fixed-width code-point string, one `u32` unit per character.
    Unicode,
    /// Opaque fixed-size bytes without fields.
    Void,
    /// Structured record with named, offset-addressed fields.
    Record,
    /// Generic reference to a host value.
    Object,
    /// Externally registered kind.
    User(u16),
}

impl Kind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::UInt => "uint",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::Bytes => "bytes",
            Kind::Unicode => "unicode",
            Kind::Void => "void",
            Kind::Record => "record",
            Kind::Object => "object",
            Kind::User(_) => "user",
        }
    }

    /// Fixed-width text kinds.
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, Kind::Bytes | Kind::Unicode)
    }

    /// Kinds that only support equality comparisons.
    #[inline]
    pub fn is_structured(self) -> bool {
        matches!(self, Kind::Record | Kind::Void)
    }

    /// Bool and numeric kinds.
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Kind::Bool | Kind::Int | Kind::UInt | Kind::Float | Kind::Complex
        )
    }

    /// Byte size of one text code unit, `None` for non-text kinds.
    #[inline]
    pub fn unit_size(self) -> Option<usize> {
        match self {
            Kind::Bytes => Some(1),
            Kind::Unicode => Some(4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classes() {
        assert!(Kind::Bytes.is_text());
        assert!(Kind::Unicode.is_text());
        assert!(!Kind::Void.is_text());
        assert!(Kind::Record.is_structured());
        assert!(Kind::Void.is_structured());
        assert!(Kind::Complex.is_numeric());
        assert!(!Kind::Object.is_numeric());
        assert_eq!(Kind::Unicode.unit_size(), Some(4));
        assert_eq!(Kind::Float.unit_size(), None);
    }
}
