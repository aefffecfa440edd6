//! # Sequence Codec
//!
//! Compresses whole integer sequences into a raw stream of VarInt groups and
//! back. There is no framing: the caller keeps track of the element count,
//! the width (the `T` parameter) and the [`Layout`].
//!
//! The unchecked functions trust their input completely. Output buffers must
//! be at least [`compressed_size_unsorted`] / [`compressed_size_sorted`]
//! bytes long and the sorted layout expects strictly increasing values.
//! Violations panic on a slice bound or produce a corrupt stream; they never
//! write out of bounds. The `try_*` functions
//! validate the same contracts and report [`Error`]s instead.

use crate::error::Error;
use crate::varint::VarInt;

/// How values are laid out in a compressed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Each group holds a value as-is.
    #[default]
    Unsorted,
    /// Each group holds the difference to the previous value (the first one
    /// to an implicit zero). Values must be strictly increasing.
    Sorted,
}

impl Layout {
    /// The lowercase name of the layout.
    pub fn name(&self) -> &'static str {
        match self {
            Layout::Unsorted => "unsorted",
            Layout::Sorted => "sorted",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Successive differences of `values`, starting from zero.
fn deltas<T: VarInt>(values: &[T]) -> impl Iterator<Item = T> + '_ {
    values.iter().scan(T::ZERO, |previous, &value| {
        let delta = value.wrapping_sub(*previous);
        *previous = value;
        Some(delta)
    })
}

/// Number of bytes [`compress_unsorted`] writes for `values`.
pub fn compressed_size_unsorted<T: VarInt>(values: &[T]) -> usize {
    values.iter().map(|value| value.encoded_size()).sum()
}

/// Number of bytes [`compress_sorted`] writes for `values`.
pub fn compressed_size_sorted<T: VarInt>(values: &[T]) -> usize {
    deltas(values).map(VarInt::encoded_size).sum()
}

/// Writes every value as its own group and returns the bytes written.
///
/// ## Panics
/// If `out` is shorter than [`compressed_size_unsorted`].
pub fn compress_unsorted<T: VarInt>(values: &[T], out: &mut [u8]) -> usize {
    values
        .iter()
        .fold(0, |written, &value| written + value.encode(&mut out[written..]))
}

/// Writes the differences between consecutive values and returns the bytes
/// written.
///
/// Non-increasing input wraps around instead of panicking. The stream stays
/// well-formed, but lower-bound search over it returns meaningless results.
///
/// ## Panics
/// If `out` is shorter than [`compressed_size_sorted`].
pub fn compress_sorted<T: VarInt>(values: &[T], out: &mut [u8]) -> usize {
    deltas(values).fold(0, |written, delta| written + delta.encode(&mut out[written..]))
}

/// Decodes `out.len()` values and returns the bytes consumed.
///
/// This is the scalar reference decoder; see [`crate::decode`] for the
/// block-accelerated ones.
///
/// ## Panics
/// If `input` ends before `out.len()` groups were read.
pub fn uncompress_unsorted<T: VarInt>(input: &[u8], out: &mut [T]) -> usize {
    let mut consumed = 0;
    for slot in out.iter_mut() {
        let (value, length) = T::decode(&input[consumed..]);
        *slot = value;
        consumed += length;
    }
    consumed
}

/// Decodes `out.len()` delta-coded values and returns the bytes consumed.
///
/// ## Panics
/// If `input` ends before `out.len()` groups were read.
pub fn uncompress_sorted<T: VarInt>(input: &[u8], out: &mut [T]) -> usize {
    let mut consumed = 0;
    let mut previous = T::ZERO;
    for slot in out.iter_mut() {
        let (delta, length) = T::decode(&input[consumed..]);
        previous = previous.wrapping_add(delta);
        *slot = previous;
        consumed += length;
    }
    consumed
}

/// Writes `value` at the start of `out`, the tail of an unsorted stream.
pub fn append_unsorted<T: VarInt>(out: &mut [u8], value: T) -> usize {
    value.encode(out)
}

/// Writes `value - previous` at the start of `out`, the tail of a sorted
/// stream whose last value is `previous`.
pub fn append_sorted<T: VarInt>(out: &mut [u8], previous: T, value: T) -> usize {
    debug_assert!(
        value > previous,
        "sorted append requires {value:?} > {previous:?}"
    );
    value.wrapping_sub(previous).encode(out)
}

/// Compresses `values` in the unsorted layout into an exactly sized buffer.
pub fn encode_unsorted<T: VarInt>(values: &[T]) -> Vec<u8> {
    let mut out = vec![0; compressed_size_unsorted(values)];
    compress_unsorted(values, &mut out);
    out
}

/// Compresses `values` in the sorted layout into an exactly sized buffer.
pub fn encode_sorted<T: VarInt>(values: &[T]) -> Vec<u8> {
    let mut out = vec![0; compressed_size_sorted(values)];
    compress_sorted(values, &mut out);
    out
}

/// Compresses `values` in `layout` into an exactly sized buffer.
pub fn encode<T: VarInt>(layout: Layout, values: &[T]) -> Vec<u8> {
    match layout {
        Layout::Unsorted => encode_unsorted(values),
        Layout::Sorted => encode_sorted(values),
    }
}

/// [`compress_unsorted`] that checks the output size first.
pub fn try_compress_unsorted<T: VarInt>(values: &[T], out: &mut [u8]) -> Result<usize, Error> {
    let required = compressed_size_unsorted(values);
    if out.len() < required {
        return Err(Error::BufferTooSmall { required, available: out.len() });
    }
    Ok(compress_unsorted(values, out))
}

/// [`compress_sorted`] that checks ordering and output size first.
pub fn try_compress_sorted<T: VarInt>(values: &[T], out: &mut [u8]) -> Result<usize, Error> {
    if let Some(position) = values.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(Error::NotStrictlyIncreasing { index: position + 1 });
    }

    let required = compressed_size_sorted(values);
    if out.len() < required {
        return Err(Error::BufferTooSmall { required, available: out.len() });
    }
    Ok(compress_sorted(values, out))
}

/// [`uncompress_unsorted`] that rejects truncated and malformed groups.
pub fn try_uncompress_unsorted<T: VarInt>(input: &[u8], out: &mut [T]) -> Result<usize, Error> {
    let mut consumed = 0;
    for slot in out.iter_mut() {
        let (value, length) = T::try_decode(&input[consumed..])?;
        *slot = value;
        consumed += length;
    }
    Ok(consumed)
}

/// [`uncompress_sorted`] that rejects truncated and malformed groups.
///
/// Deltas are summed with wrapping arithmetic, as in the unchecked decoder.
pub fn try_uncompress_sorted<T: VarInt>(input: &[u8], out: &mut [T]) -> Result<usize, Error> {
    let mut consumed = 0;
    let mut previous = T::ZERO;
    for slot in out.iter_mut() {
        let (delta, length) = T::try_decode(&input[consumed..])?;
        previous = previous.wrapping_add(delta);
        *slot = previous;
        consumed += length;
    }
    Ok(consumed)
}

/// Checks that `input` starts with `count` well-formed groups and returns the
/// bytes they occupy. A stream that passes can be handed to the unchecked
/// decoders, select (with an index below `count`) and search.
pub fn validate<T: VarInt>(input: &[u8], count: usize) -> Result<usize, Error> {
    let mut consumed = 0;
    for _ in 0..count {
        consumed += T::try_decode(&input[consumed..])?.1;
    }
    Ok(consumed)
}
