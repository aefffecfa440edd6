//! # Search
//!
//! Linear search over an unsorted stream and lower-bound search over a sorted
//! one. Both take the number of values in the stream and return
//! `(position, value)`, with `(length, None)` when nothing matched.
//!
//! The sorted stream is monotonically increasing, so the accelerated lower
//! bound can reject a whole block by comparing its last value (the running
//! sum plus the block's delta sum) with the target, without materializing
//! the values inside it.

use crate::select::block_delta_sum;
use crate::table::{self, block_table, BLOCK_SIZE};
use crate::varint::VarInt;

/// Finds a position holding `target` among the first `length` values of an
/// unsorted stream.
pub fn search_unsorted<T: VarInt>(input: &[u8], length: usize, target: T) -> (usize, Option<T>) {
    let mut position = 0;
    for index in 0..length {
        let (value, size) = T::decode(&input[position..]);
        if value == target {
            return (index, Some(value));
        }
        position += size;
    }
    (length, None)
}

/// Finds the first of `length` sorted values that is `>= target`, skipping
/// whole blocks that end below it.
pub fn search_sorted_lower_bound<T: VarInt>(input: &[u8], length: usize, target: T) -> (usize, Option<T>) {
    search_sorted_lower_bound_with(input, length, target, table::continuation_mask)
}

/// Finds the first of `length` sorted values that is `>= target`, decoding
/// every value up to it.
pub fn search_sorted_lower_bound_scalar<T: VarInt>(
    input: &[u8],
    length: usize,
    target: T,
) -> (usize, Option<T>) {
    scan_lower_bound(input, 0, 0, length, T::ZERO, target)
}

pub(crate) fn search_sorted_lower_bound_with<T, M>(
    input: &[u8],
    length: usize,
    target: T,
    mask_of: M,
) -> (usize, Option<T>)
where
    T: VarInt,
    M: Fn(&[u8]) -> u16,
{
    let table = block_table();
    let mut position = 0;
    let mut index = 0;
    let mut previous = T::ZERO;

    while length - index >= BLOCK_SIZE {
        let block = &input[position..position + BLOCK_SIZE];
        let mask = mask_of(block);
        let entry = table.entry(mask);
        let num_ints = entry.num_ints as usize;

        if !entry.fits(T::MAX_BYTES) {
            break;
        }

        let block_end = previous.wrapping_add(block_delta_sum(block, mask, entry));
        if block_end >= target {
            let mut offset = 0;
            for size in entry.group_lengths() {
                previous = previous.wrapping_add(T::from_group(&block[offset..offset + size]));
                if previous >= target {
                    return (index, Some(previous));
                }
                index += 1;
                offset += size;
            }
        } else {
            previous = block_end;
            index += num_ints;
        }
        position += entry.num_bytes as usize;
    }

    scan_lower_bound(input, position, index, length, previous, target)
}

/// Scalar lower-bound scan of the values `index..length`, whose first group
/// starts at `position` and whose predecessor is `previous`.
fn scan_lower_bound<T: VarInt>(
    input: &[u8],
    mut position: usize,
    index: usize,
    length: usize,
    mut previous: T,
    target: T,
) -> (usize, Option<T>) {
    for index in index..length {
        let (delta, size) = T::decode(&input[position..]);
        previous = previous.wrapping_add(delta);
        if previous >= target {
            return (index, Some(previous));
        }
        position += size;
    }
    (length, None)
}
