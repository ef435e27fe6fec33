//! Fixed-width text comparison with NUL-padding equivalence.

use std::cmp::Ordering;

use smallvec::SmallVec;
use strided_array::Array;
use strided_dtype::Kind;

use crate::output::compare_pairs;
use crate::{CompareError, CompareOp, CompareOptions, Result, TextPolicy};

type Units = SmallVec<[u32; 32]>;

/// Code unit size of a kind compared as text. Opaque bytes compare as byte
/// strings.
fn unit_size(kind: Kind) -> Option<usize> {
    match kind {
        Kind::Bytes | Kind::Void => Some(1),
        Kind::Unicode => Some(4),
        _ => None,
    }
}

fn is_space(unit: u32, kind: Kind) -> bool {
    match kind {
        Kind::Unicode => char::from_u32(unit).map_or(false, char::is_whitespace),
        _ => matches!(unit, 0x09..=0x0d | 0x20),
    }
}

/// Zero trailing whitespace and NULs, keeping at least the first unit.
pub(crate) fn rstrip(units: &mut [u32], kind: Kind) {
    for i in (1..units.len()).rev() {
        if units[i] == 0 || is_space(units[i], kind) {
            units[i] = 0;
        } else {
            break;
        }
    }
}

/// Order two fixed-width strings of possibly different declared widths.
///
/// The shared prefix decides first; past it the longer string is greater
/// only if its tail holds a non-zero unit.
pub fn compare_padded(a: &[u32], b: &[u32]) -> Ordering {
    let n = a.len().min(b.len());
    match a[..n].cmp(&b[..n]) {
        Ordering::Equal => {}
        ord => return ord,
    }
    if a[n..].iter().any(|&u| u != 0) {
        Ordering::Greater
    } else if b[n..].iter().any(|&u| u != 0) {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn load(ptr: *const u8, kind: Kind, width: usize, strip: bool, out: &mut Units) {
    out.clear();
    match kind {
        Kind::Unicode => {
            let bytes = unsafe { std::slice::from_raw_parts(ptr, width * 4) };
            out.extend(bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<u32>));
        }
        _ => {
            let bytes = unsafe { std::slice::from_raw_parts(ptr, width) };
            out.extend(bytes.iter().map(|&b| b as u32));
        }
    }
    if strip {
        rstrip(out, kind);
    }
}

/// Compare two text arrays elementwise.
///
/// Byte and code-point text only meet under `==`/`!=`; ordering them is a
/// [`CompareError::TypeMismatch`]. With [`TextPolicy::Reject`] such mixed
/// pairs answer `None`.
pub(crate) fn compare_text(
    lhs: &Array,
    rhs: &Array,
    op: CompareOp,
    strip: bool,
    options: &CompareOptions,
) -> Result<Option<Array>> {
    let (lk, rk) = (lhs.dtype().kind(), rhs.dtype().kind());
    let (Some(lu), Some(ru)) = (unit_size(lk), unit_size(rk)) else {
        return Err(CompareError::TypeMismatch(format!(
            "{} and {} are not both text",
            lhs.dtype(),
            rhs.dtype()
        )));
    };
    if lu != ru {
        if !op.is_equality() {
            return Err(CompareError::TypeMismatch(format!(
                "cannot order {} text against {} text",
                lk.name(),
                rk.name()
            )));
        }
        if options.text_policy == TextPolicy::Reject {
            tracing::debug!(lhs = lk.name(), rhs = rk.name(), "mixed text kinds rejected");
            return Ok(None);
        }
    }

    let (lw, rw) = (lhs.itemsize() / lu, rhs.itemsize() / ru);
    let mut a = Units::new();
    let mut b = Units::new();
    let out = compare_pairs(lhs, rhs, options.mask_policy, |pa, pb| {
        load(pa, lk, lw, strip, &mut a);
        load(pb, rk, rw, strip, &mut b);
        Ok(op.apply(compare_padded(&a, &b)))
    })?;
    Ok(Some(out))
}

/// Compare two fixed-width text arrays, optionally ignoring trailing
/// whitespace.
///
/// Byte text against code-point text is widened for `==` and `!=`.
pub fn compare_strings(lhs: &Array, rhs: &Array, op: CompareOp, rstrip: bool) -> Result<Array> {
    let options = CompareOptions::default();
    for a in [lhs, rhs] {
        if !a.dtype().is_text() {
            return Err(CompareError::TypeMismatch(format!("{} is not a text dtype", a.dtype())));
        }
    }
    compare_text(lhs, rhs, op, rstrip, &options)?
        .ok_or_else(|| CompareError::TypeMismatch("mixed text kinds".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn test_nul_padding_equivalence() {
        assert_eq!(compare_padded(&units("ab"), &units("ab\0")), Ordering::Equal);
        assert_eq!(compare_padded(&units("ab\0\0"), &units("ab")), Ordering::Equal);
        assert_eq!(compare_padded(&units("ab"), &units("abc")), Ordering::Less);
        assert_eq!(compare_padded(&units("abc"), &units("ab")), Ordering::Greater);
        assert_eq!(compare_padded(&units("b"), &units("abc")), Ordering::Greater);
    }

    #[test]
    fn test_units_compare_unsigned() {
        assert_eq!(compare_padded(&[0xff], &[0x01]), Ordering::Greater);
        assert_eq!(compare_padded(&[0x1f600], &[0x41]), Ordering::Greater);
    }

    #[test]
    fn test_rstrip_keeps_first_unit() {
        let mut u = units("ab \t\0");
        rstrip(&mut u, Kind::Bytes);
        assert_eq!(u, units("ab\0\0\0"));

        let mut u = units("   ");
        rstrip(&mut u, Kind::Bytes);
        assert_eq!(u, units(" \0\0"));

        let mut u = units("a\u{3000}");
        rstrip(&mut u, Kind::Unicode);
        assert_eq!(u, units("a\0"));
    }
}
