//! The reference decoder: one [`VarInt::decode`] call per value.

use super::BulkDecoder;
use crate::codec;
use crate::varint::VarInt;

/// Decodes one group at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarDecoder;

impl BulkDecoder for ScalarDecoder {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn uncompress_unsorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        codec::uncompress_unsorted(input, out)
    }

    fn uncompress_sorted<T: VarInt>(&self, input: &[u8], out: &mut [T]) -> usize {
        codec::uncompress_sorted(input, out)
    }
}
