//! Element-type descriptors.
//!
//! A [`DType`] carries the element byte size, alignment and [`Kind`] tag.
//! Record dtypes additionally carry an ordered [`FieldTable`]; array-valued
//! fields use a [`SubArray`] dtype whose shape is appended to the owning
//! array's shape when the field is extracted.

use std::sync::Arc;

use crate::kind::Kind;
use crate::{DTypeError, Result};

// ============================================================================
// DType
// ============================================================================

/// Element-type descriptor.
///
/// Equality is structural: two record dtypes are equal when their field tables
/// (names, titles, sub-dtypes, offsets) and itemsizes match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DType {
    kind: Kind,
    itemsize: usize,
    align: usize,
    fields: Option<Arc<FieldTable>>,
    subarray: Option<Arc<SubArray>>,
}

impl DType {
    fn simple(kind: Kind, itemsize: usize, align: usize) -> Self {
        Self {
            kind,
            itemsize,
            align,
            fields: None,
            subarray: None,
        }
    }

    pub fn bool() -> Self {
        Self::simple(Kind::Bool, 1, 1)
    }

    /// Signed integer of 1, 2, 4 or 8 bytes.
    pub fn int(itemsize: usize) -> Result<Self> {
        match itemsize {
            1 | 2 | 4 | 8 => Ok(Self::simple(Kind::Int, itemsize, itemsize)),
            _ => Err(DTypeError::InvalidItemsize {
                kind: "int",
                itemsize,
            }),
        }
    }

    /// Unsigned integer of 1, 2, 4 or 8 bytes.
    pub fn uint(itemsize: usize) -> Result<Self> {
        match itemsize {
            1 | 2 | 4 | 8 => Ok(Self::simple(Kind::UInt, itemsize, itemsize)),
            _ => Err(DTypeError::InvalidItemsize {
                kind: "uint",
                itemsize,
            }),
        }
    }

    /// IEEE float of 4 or 8 bytes.
    pub fn float(itemsize: usize) -> Result<Self> {
        match itemsize {
            4 | 8 => Ok(Self::simple(Kind::Float, itemsize, itemsize)),
            _ => Err(DTypeError::InvalidItemsize {
                kind: "float",
                itemsize,
            }),
        }
    }

    /// Complex number of 8 (two f32) or 16 (two f64) bytes.
    pub fn complex(itemsize: usize) -> Result<Self> {
        match itemsize {
            8 | 16 => Ok(Self::simple(Kind::Complex, itemsize, itemsize / 2)),
            _ => Err(DTypeError::InvalidItemsize {
                kind: "complex",
                itemsize,
            }),
        }
    }

    pub fn int32() -> Self {
        Self::simple(Kind::Int, 4, 4)
    }

    pub fn int64() -> Self {
        Self::simple(Kind::Int, 8, 8)
    }

    pub fn uint8() -> Self {
        Self::simple(Kind::UInt, 1, 1)
    }

    pub fn uint64() -> Self {
        Self::simple(Kind::UInt, 8, 8)
    }

    pub fn float32() -> Self {
        Self::simple(Kind::Float, 4, 4)
    }

    pub fn float64() -> Self {
        Self::simple(Kind::Float, 8, 8)
    }

    pub fn complex128() -> Self {
        Self::simple(Kind::Complex, 16, 8)
    }

    /// Fixed-width byte string holding `width` bytes.
    pub fn bytes(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(DTypeError::InvalidItemsize {
                kind: "bytes",
                itemsize: 0,
            });
        }
        Ok(Self::simple(Kind::Bytes, width, 1))
    }

    /// Fixed-width code-point string holding `width` code points.
    pub fn unicode(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(DTypeError::InvalidItemsize {
                kind: "unicode",
                itemsize: 0,
            });
        }
        Ok(Self::simple(Kind::Unicode, width * 4, 4))
    }

    /// Opaque bytes without fields.
    pub fn void(itemsize: usize) -> Result<Self> {
        if itemsize == 0 {
            return Err(DTypeError::InvalidItemsize {
                kind: "void",
                itemsize: 0,
            });
        }
        Ok(Self::simple(Kind::Void, itemsize, 1))
    }

    /// Generic reference: one pointer-sized slot per element.
    pub fn object() -> Self {
        let size = std::mem::size_of::<usize>();
        Self::simple(Kind::Object, size, size)
    }

    /// Externally registered element kind.
    pub fn user(id: u16, itemsize: usize, align: usize) -> Result<Self> {
        if itemsize == 0 || align == 0 || !align.is_power_of_two() {
            return Err(DTypeError::InvalidItemsize {
                kind: "user",
                itemsize,
            });
        }
        Ok(Self::simple(Kind::User(id), itemsize, align))
    }

    /// Record dtype from explicitly placed fields.
    ///
    /// The itemsize is the furthest field end; use
    /// [`DType::record_with_itemsize`] to add trailing padding.
    pub fn record(fields: Vec<Field>) -> Result<Self> {
        let itemsize = fields
            .iter()
            .map(|f| f.offset + f.dtype.itemsize)
            .max()
            .unwrap_or(0);
        Self::record_with_itemsize(fields, itemsize)
    }

    /// Record dtype with an explicit itemsize.
    pub fn record_with_itemsize(fields: Vec<Field>, itemsize: usize) -> Result<Self> {
        if itemsize == 0 {
            return Err(DTypeError::InvalidItemsize {
                kind: "record",
                itemsize,
            });
        }
        let table = FieldTable::new(fields)?;
        for field in table.iter() {
            if field.offset + field.dtype.itemsize > itemsize {
                return Err(DTypeError::FieldOutOfBounds {
                    name: field.name.clone(),
                    offset: field.offset,
                    itemsize,
                });
            }
        }
        let align = table.iter().map(|f| f.dtype.align).max().unwrap_or(1);
        Ok(Self {
            kind: Kind::Record,
            itemsize,
            align,
            fields: Some(Arc::new(table)),
            subarray: None,
        })
    }

    /// Record dtype laying fields out back to back in declaration order.
    pub fn record_packed(fields: Vec<(&str, DType)>) -> Result<Self> {
        let mut offset = 0usize;
        let mut placed = Vec::with_capacity(fields.len());
        for (name, dtype) in fields {
            let size = dtype.itemsize;
            placed.push(Field::new(name, dtype, offset));
            offset += size;
        }
        Self::record_with_itemsize(placed, offset)
    }

    /// Array-valued dtype: `shape` elements of `base` stored C-contiguously.
    pub fn subarray(base: DType, shape: &[usize]) -> Result<Self> {
        let itemsize = shape
            .iter()
            .try_fold(base.itemsize, |acc, &d| acc.checked_mul(d))
            .unwrap_or(0);
        if itemsize == 0 {
            return Err(DTypeError::InvalidItemsize {
                kind: "subarray",
                itemsize,
            });
        }
        Ok(Self {
            kind: base.kind,
            itemsize,
            align: base.align,
            fields: None,
            subarray: Some(Arc::new(SubArray {
                base,
                shape: shape.to_vec(),
            })),
        })
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.align
    }

    #[inline]
    pub fn fields(&self) -> Option<&FieldTable> {
        self.fields.as_deref()
    }

    #[inline]
    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    #[inline]
    pub fn subarray_info(&self) -> Option<&SubArray> {
        self.subarray.as_deref()
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.subarray.is_none() && self.kind.is_text()
    }

    /// Declared text width in code units.
    pub fn text_width(&self) -> Option<usize> {
        if self.subarray.is_some() {
            return None;
        }
        self.kind.unit_size().map(|unit| self.itemsize / unit)
    }

    /// Strip a sub-array dtype into its base dtype and trailing shape.
    ///
    /// Non-sub-array dtypes return themselves with an empty shape.
    pub fn expand(&self) -> (DType, Vec<usize>) {
        match &self.subarray {
            Some(sub) => {
                let (inner, mut inner_shape) = sub.base.expand();
                let mut shape = sub.shape.clone();
                shape.append(&mut inner_shape);
                (inner, shape)
            }
            None => (self.clone(), Vec::new()),
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sub) = &self.subarray {
            return write!(f, "({}, {:?})", sub.base, sub.shape);
        }
        match self.kind {
            Kind::Record => {
                write!(f, "{{")?;
                if let Some(table) = &self.fields {
                    for (i, field) in table.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: {} @{}", field.name, field.dtype, field.offset)?;
                    }
                }
                write!(f, "}}")
            }
            Kind::Unicode => write!(f, "unicode{}", self.itemsize / 4),
            kind => write!(f, "{}{}", kind.name(), self.itemsize),
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// One named field of a record dtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Optional alias; lookups accept it, iteration never yields it.
    pub title: Option<String>,
    pub dtype: DType,
    pub offset: usize,
}

impl Field {
    pub fn new(name: &str, dtype: DType, offset: usize) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            dtype,
            offset,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// Ordered field table of a record dtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    fields: Vec<Field>,
}

impl FieldTable {
    fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::new();
        for field in &fields {
            let keys = std::iter::once(field.name.as_str()).chain(field.title.as_deref());
            for key in keys {
                if seen.contains(&key) {
                    return Err(DTypeError::DuplicateField(key.to_string()));
                }
                seen.push(key);
            }
        }
        Ok(Self { fields })
    }

    /// Look up a field by name or title.
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == key || f.title.as_deref() == Some(key))
    }

    /// Canonical fields in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shape and base dtype of an array-valued dtype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubArray {
    pub base: DType,
    pub shape: Vec<usize>,
}
