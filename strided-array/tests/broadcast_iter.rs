use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strided_array::{broadcast_shapes, Array, ArrayError, MemoryOrder, MultiIter};
use strided_dtype::{DType, Scalar};

fn arange(shape: &[usize]) -> Array {
    let n: usize = shape.iter().product();
    let values: Vec<Scalar> = (0..n as i64).map(Scalar::Int).collect();
    Array::from_scalars(DType::int64(), shape, &values).unwrap()
}

fn read(p: *mut u8) -> i64 {
    unsafe { std::ptr::read_unaligned(p as *const i64) }
}

/// Row-major linear value of `coords` in an `arange(shape)` array, after
/// stretching `shape` to the broadcast coordinates.
fn expected_value(shape: &[usize], coords: &[usize]) -> i64 {
    let pad = coords.len() - shape.len();
    let mut value = 0i64;
    for (j, &dim) in shape.iter().enumerate() {
        let c = if dim == 1 { 0 } else { coords[pad + j] };
        value = value * dim as i64 + c as i64;
    }
    value
}

fn random_compatible_shapes(rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let ndim = rng.gen_range(0..=4);
    let full: Vec<usize> = (0..ndim).map(|_| rng.gen_range(1..=4)).collect();
    let mut pick = |full: &[usize]| -> Vec<usize> {
        let drop = rng.gen_range(0..=full.len());
        full[drop..]
            .iter()
            .map(|&d| if rng.gen_bool(0.3) { 1 } else { d })
            .collect()
    };
    let a = pick(&full);
    let b = pick(&full);
    (a, b)
}

#[test]
fn test_randomized_lock_step_matches_index_math() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let (sa, sb) = random_compatible_shapes(&mut rng);
        let shape = broadcast_shapes(&[&sa, &sb]).unwrap();
        let a = arange(&sa);
        let b = arange(&sb);
        // Exercise non-contiguous layouts too.
        let a = if rng.gen_bool(0.5) {
            a.copy(MemoryOrder::F).unwrap()
        } else {
            a
        };

        let mut it = MultiIter::new(&[&a, &b]).unwrap();
        assert_eq!(it.shape(), shape.as_slice());
        let mut count = 0;
        while let Some(ptrs) = it.next() {
            let (x, y) = (read(ptrs[0]), read(ptrs[1]));
            let coords = it.coords().to_vec();
            assert_eq!(x, expected_value(&sa, &coords), "a {sa:?} at {coords:?}");
            assert_eq!(y, expected_value(&sb, &coords), "b {sb:?} at {coords:?}");
            assert_eq!(it.index(), count);
            count += 1;
        }
        assert_eq!(count, it.size());
    }
}

#[test]
fn test_incompatible_shapes_fail() {
    let a = arange(&[3, 2]);
    let b = arange(&[1, 4]);
    assert!(matches!(
        MultiIter::new(&[&a, &b]),
        Err(ArrayError::ShapeMismatch(_, _))
    ));
}

#[test]
fn test_three_operands_with_mask() {
    let a = arange(&[2, 1]);
    let b = arange(&[3]);
    let c = arange(&[1, 1]);
    b.allocate_mask(true).unwrap();
    b.set_valid(&[1], false).unwrap();
    let mut it = MultiIter::new(&[&a, &b, &c]).unwrap();
    assert_eq!(it.shape(), &[2, 3]);
    assert_eq!(it.num_operands(), 3);
    let mut validity = Vec::new();
    while it.next().is_some() {
        assert!(it.mask_ptr(0).is_none());
        assert!(it.mask_ptr(1).is_some());
        validity.push(it.is_valid(1));
    }
    assert_eq!(validity, vec![true, false, true, true, false, true]);
}
