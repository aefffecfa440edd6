//! A configured entry point over the codec, decoders, select and search.

use crate::codec::Layout;
use crate::config::Settings;
use crate::decode::{BulkDecoder, Strategy};
use crate::select;
use crate::search;
use crate::simd;
use crate::table;
use crate::varint::VarInt;

/// Dispatches every operation in a given [`Layout`] to the configured
/// implementation.
///
/// Block skipping applies to select and lower-bound search. It is off for
/// [`Strategy::Scalar`] regardless of the setting, so that a scalar engine
/// never touches the block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    strategy: Strategy,
    block_skipping: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(Strategy::default(), true)
    }
}

impl Engine {
    /// Creates an engine, degrading [`Strategy::Simd`] when unavailable.
    pub fn new(strategy: Strategy, block_skipping: bool) -> Self {
        let engine = Engine {
            strategy: strategy.effective(),
            block_skipping: block_skipping && strategy != Strategy::Scalar,
        };
        tracing::debug!(
            requested = %strategy,
            strategy = %engine.strategy,
            block_skipping = engine.block_skipping,
            "created engine"
        );
        engine
    }

    /// Creates an engine from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Engine::new(settings.engine.strategy, settings.engine.block_skipping)
    }

    /// The strategy in effect.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether select and search skip whole blocks.
    pub fn block_skipping(&self) -> bool {
        self.block_skipping
    }

    fn mask_of(&self) -> fn(&[u8]) -> u16 {
        match self.strategy {
            Strategy::Simd => simd::movemask,
            Strategy::Scalar | Strategy::Block => table::continuation_mask,
        }
    }

    /// Decodes `out.len()` values and returns the bytes consumed.
    pub fn uncompress<T: VarInt>(&self, layout: Layout, input: &[u8], out: &mut [T]) -> usize {
        self.strategy.uncompress(layout, input, out)
    }

    /// Returns the value at `index`.
    pub fn select<T: VarInt>(&self, layout: Layout, input: &[u8], index: usize) -> T {
        match (layout, self.block_skipping) {
            (Layout::Unsorted, true) => select::select_unsorted_with(input, index, self.mask_of()),
            (Layout::Unsorted, false) => select::select_unsorted_scalar(input, index),
            (Layout::Sorted, true) => select::select_sorted_with(input, index, self.mask_of()),
            (Layout::Sorted, false) => select::select_sorted_scalar(input, index),
        }
    }

    /// Searches the first `length` values for `target`: an exact match for
    /// the unsorted layout, the lower bound for the sorted one.
    pub fn search<T: VarInt>(
        &self,
        layout: Layout,
        input: &[u8],
        length: usize,
        target: T,
    ) -> (usize, Option<T>) {
        match (layout, self.block_skipping) {
            (Layout::Unsorted, _) => search::search_unsorted(input, length, target),
            (Layout::Sorted, true) => {
                search::search_sorted_lower_bound_with(input, length, target, self.mask_of())
            }
            (Layout::Sorted, false) => search::search_sorted_lower_bound_scalar(input, length, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::config::EngineSettings;

    fn engines() -> Vec<Engine> {
        Strategy::ALL
            .into_iter()
            .flat_map(|strategy| [Engine::new(strategy, true), Engine::new(strategy, false)])
            .collect()
    }

    #[test]
    fn test_scalar_engine_never_skips() {
        assert!(!Engine::new(Strategy::Scalar, true).block_skipping());
        assert!(Engine::new(Strategy::Block, true).block_skipping());
        assert_eq!(Engine::default().strategy(), Strategy::Block);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            engine: EngineSettings {
                strategy: Strategy::Scalar,
                block_skipping: false,
            },
        };
        let engine = Engine::from_settings(&settings);
        assert_eq!(engine.strategy(), Strategy::Scalar);
        assert!(!engine.block_skipping());
    }

    #[test]
    fn test_sixteen_multiples_of_seven() {
        let values: Vec<u32> = (0..16).map(|i| i * 7).collect();

        for engine in engines() {
            let compressed = codec::encode(Layout::Sorted, &values);
            let mut decoded = [0u32; 16];
            assert_eq!(engine.uncompress(Layout::Sorted, &compressed, &mut decoded), 16);
            assert_eq!(decoded.as_slice(), values.as_slice());
            assert_eq!(engine.select::<u32>(Layout::Sorted, &compressed, 15), 105);
            assert_eq!(engine.search(Layout::Sorted, &compressed, 16, 50u32), (8, Some(56)));
        }
    }

    #[test]
    fn test_engines_agree() {
        let values: Vec<u64> = (0..300u64).map(|i| i * i * 1013 + i).collect();

        for engine in engines() {
            for layout in [Layout::Unsorted, Layout::Sorted] {
                let compressed = codec::encode(layout, &values);
                let mut decoded = vec![0u64; values.len()];
                engine.uncompress(layout, &compressed, &mut decoded);
                assert_eq!(decoded, values, "{engine:?} {layout}");

                for index in (0..values.len()).step_by(13) {
                    assert_eq!(engine.select::<u64>(layout, &compressed, index), values[index]);
                    assert_eq!(
                        engine.search(layout, &compressed, values.len(), values[index]),
                        (index, Some(values[index]))
                    );
                }
            }
        }
    }
}
