//! Round-trip testing across every decoder, select and search for a wide
//! variety of input patterns, in both widths and both layouts.

use crate::codec::{self, Layout};
use crate::decode::{BulkDecoder, Strategy};
use crate::search;
use crate::select;
use crate::varint::VarInt;
use proptest::prelude::*;
use test_case::test_case;

/// Compresses `values`, then checks the size estimate, every decoder and
/// both select implementations against the input.
fn roundtrip_test<T: VarInt>(layout: Layout, values: &[T]) -> Result<(), TestCaseError> {
    let (compressed, expected_size) = match layout {
        Layout::Unsorted => (codec::encode_unsorted(values), codec::compressed_size_unsorted(values)),
        Layout::Sorted => (codec::encode_sorted(values), codec::compressed_size_sorted(values)),
    };
    prop_assert_eq!(compressed.len(), expected_size);

    for strategy in Strategy::ALL {
        let mut decoded = vec![T::ZERO; values.len()];
        let consumed = strategy.uncompress(layout, &compressed, &mut decoded);
        prop_assert_eq!(consumed, compressed.len(), "{} consumed", strategy);
        prop_assert_eq!(&decoded, values, "{} decoded", strategy);
    }

    for (index, &value) in values.iter().enumerate() {
        let (accelerated, scalar) = match layout {
            Layout::Unsorted => (
                select::select_unsorted::<T>(&compressed, index),
                select::select_unsorted_scalar::<T>(&compressed, index),
            ),
            Layout::Sorted => (
                select::select_sorted::<T>(&compressed, index),
                select::select_sorted_scalar::<T>(&compressed, index),
            ),
        };
        prop_assert_eq!(accelerated, value);
        prop_assert_eq!(scalar, value);
    }

    Ok(())
}

/// Sorts and deduplicates `values` into a strictly increasing sequence.
fn to_strictly_increasing<T: VarInt>(values: &[T]) -> Vec<T> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Lengths around the block size, where block and scalar paths hand over.
#[test_case(0 ; "empty")]
#[test_case(1 ; "single")]
#[test_case(2 ; "pair")]
#[test_case(10 ; "ten")]
#[test_case(15 ; "block minus one")]
#[test_case(16 ; "exactly one block")]
#[test_case(17 ; "block plus one")]
#[test_case(33 ; "two blocks plus one")]
#[test_case(128 ; "one hundred twenty eight")]
#[test_case(1000 ; "one thousand")]
fn test_roundtrip_multiples_of_seven(count: u64) {
    let wide: Vec<u64> = (0..count).map(|i| i * 7).collect();
    let narrow: Vec<u32> = wide.iter().map(|&v| v as u32).collect();

    for layout in [Layout::Unsorted, Layout::Sorted] {
        roundtrip_test(layout, &narrow).expect("u32 round-trip failed");
        roundtrip_test(layout, &wide).expect("u64 round-trip failed");
    }
}

#[test]
fn test_sixteen_multiples_of_seven() {
    let values: Vec<u32> = (0..16).map(|i| i * 7).collect();
    let compressed = codec::encode_sorted(&values);

    let mut decoded = [0u32; 16];
    Strategy::Block.uncompress_sorted(&compressed, &mut decoded);
    assert_eq!(decoded.as_slice(), values.as_slice());

    assert_eq!(select::select_sorted::<u32>(&compressed, 15), 105);
    assert_eq!(search::search_sorted_lower_bound(&compressed, 16, 50u32), (8, Some(56)));
}

/// Twenty single-byte groups, then a group whose last permitted byte still
/// carries a continuation bit, then forty more single-byte groups.
fn overlong_group_in_second_block(max_bytes: usize) -> Vec<u8> {
    let mut input: Vec<u8> = (1..=20).collect();
    input.extend(std::iter::repeat(0x80).take(max_bytes - 1));
    input.push(0x81);
    input.extend(1..=40);
    input
}

/// Select and lower-bound search agree with their scalar versions.
fn check_overlong_group<T: VarInt>(input: &[u8], count: usize) {
    let mut values = vec![T::ZERO; count];
    codec::uncompress_sorted(input, &mut values);

    for index in 0..count {
        assert_eq!(
            select::select_unsorted::<T>(input, index),
            select::select_unsorted_scalar::<T>(input, index),
            "unsorted {index}"
        );
        assert_eq!(select::select_sorted::<T>(input, index), values[index], "sorted {index}");
        assert_eq!(select::select_sorted_scalar::<T>(input, index), values[index], "sorted {index}");

        for target in [values[index], values[index].wrapping_add(T::from_byte(1))] {
            assert_eq!(
                search::search_sorted_lower_bound(input, count, target),
                search::search_sorted_lower_bound_scalar(input, count, target),
                "target {target:?}"
            );
        }
    }
}

#[test]
fn test_last_permitted_byte_ends_group_in_select_and_search() {
    check_overlong_group::<u32>(&overlong_group_in_second_block(u32::MAX_BYTES), 50);
    check_overlong_group::<u64>(&overlong_group_in_second_block(u64::MAX_BYTES), 50);
}

proptest! {
    #[test]
    fn test_roundtrip_unsorted_u32(values in prop::collection::vec(any::<u32>(), 0..500)) {
        roundtrip_test(Layout::Unsorted, &values)?;
    }

    #[test]
    fn test_roundtrip_unsorted_u64(values in prop::collection::vec(any::<u64>(), 0..300)) {
        roundtrip_test(Layout::Unsorted, &values)?;
    }

    /// Small values keep most blocks all single-byte, exercising the
    /// widening path.
    #[test]
    fn test_roundtrip_small_values(values in prop::collection::vec(0u32..200, 0..500)) {
        roundtrip_test(Layout::Unsorted, &values)?;
    }

    #[test]
    fn test_roundtrip_sorted_dense(values in prop::collection::vec(0u32..20_000, 0..1000)) {
        roundtrip_test(Layout::Sorted, &to_strictly_increasing(&values))?;
    }

    #[test]
    fn test_roundtrip_sorted_sparse(values in prop::collection::vec(any::<u64>(), 0..300)) {
        roundtrip_test(Layout::Sorted, &to_strictly_increasing(&values))?;
    }

    #[test]
    fn test_lower_bound_matches_reference(
        increments in prop::collection::vec(1u64..5_000, 0..400),
        target_fraction in 0.0f64..2.0,
    ) {
        let values: Vec<u64> = increments
            .iter()
            .scan(0u64, |sum, &increment| {
                *sum += increment;
                Some(*sum)
            })
            .collect();
        let compressed = codec::encode_sorted(&values);
        let max = values.last().copied().unwrap_or(0);
        let target = (max as f64 * target_fraction) as u64;

        let position = values.partition_point(|&value| value < target);
        let expected = (position, values.get(position).copied());
        prop_assert_eq!(search::search_sorted_lower_bound(&compressed, values.len(), target), expected);
        prop_assert_eq!(search::search_sorted_lower_bound_scalar(&compressed, values.len(), target), expected);
    }
}
