//! Field-wise comparison of structured records.

use strided_array::Array;

use crate::output::{fold, reduce_trailing};
use crate::{CompareError, CompareOp, Comparator, Result};

/// Compare two arrays of the same record dtype with `==` or `!=`.
///
/// Fields are visited in declared order, each compared recursively through
/// its field view. Array-valued fields yield trailing axes, which are
/// reduced before folding: AND across everything for `==`, OR for `!=`.
/// A field pair the engine cannot compare makes the whole comparison
/// `None`.
pub(crate) fn compare_records(
    engine: &Comparator,
    lhs: &Array,
    rhs: &Array,
    op: CompareOp,
) -> Result<Option<Array>> {
    if !op.is_equality() {
        return Err(CompareError::UnsupportedComparison(op));
    }
    let fields = match lhs.dtype().fields() {
        Some(fields) if !fields.is_empty() => fields,
        _ => return Err(CompareError::NoFieldsFound),
    };
    let keep = lhs.ndim().max(rhs.ndim());

    let mut acc: Option<Array> = None;
    for field in fields.iter() {
        let a = lhs.field(&field.name)?;
        let b = rhs.field(&field.name)?;
        let Some(mut part) = engine.compare_pair(&a, &b, op)? else {
            tracing::debug!(field = %field.name, "record field is not comparable");
            return Ok(None);
        };
        if part.ndim() > keep {
            part = reduce_trailing(&part, keep, op)?;
        }
        acc = Some(match acc {
            None => part,
            Some(prev) => fold(&prev, &part, op)?,
        });
    }
    Ok(acc)
}
