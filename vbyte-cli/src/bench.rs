//! Throughput benchmark over every decode strategy.
//!
//! Inputs of each requested size are generated twice: `7 * i` (mostly
//! single-byte deltas) and a random strictly increasing sequence whose deltas
//! take one or two bytes. Each input is compressed in both layouts and
//! decoded `loops` times per strategy. The output, the select samples and the
//! search samples are checked against the input before timings are reported.

use std::error::Error;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vbyte::{codec, BulkDecoder, Engine, Layout, Strategy};

const SEED: u64 = 0x5EED;

/// One benchmark input.
struct Dataset {
    name: &'static str,
    values: Vec<u32>,
}

fn datasets(size: usize, rng: &mut StdRng) -> [Dataset; 2] {
    let ascending = (0..size as u32).map(|i| i.wrapping_mul(7)).collect();

    let mut previous = 0u32;
    let random = (0..size)
        .map(|_| {
            let gap_bits = rng.gen_range(1..12);
            previous = previous.wrapping_add(rng.gen_range(1..1u32 << gap_bits));
            previous
        })
        .collect();

    [
        Dataset { name: "ascending", values: ascending },
        Dataset { name: "random", values: random },
    ]
}

/// Timing of one strategy on one input.
#[derive(Debug)]
struct Measurement {
    strategy: Strategy,
    samples: usize,
    decode: Duration,
    select: Duration,
    search: Duration,
}

#[tracing::instrument(skip(values, compressed))]
fn measure(
    strategy: Strategy,
    layout: Layout,
    values: &[u32],
    compressed: &[u8],
    loops: usize,
) -> Result<Measurement, Box<dyn Error>> {
    let engine = Engine::new(strategy, true);
    let mut decoded = vec![0u32; values.len()];

    let start = Instant::now();
    for _ in 0..loops {
        strategy.uncompress(layout, compressed, &mut decoded);
    }
    let decode = start.elapsed();

    if decoded != values {
        return Err(format!("{strategy} decoder produced wrong output for the {layout} layout").into());
    }

    // A fixed stride of samples keeps the work identical across strategies.
    let samples: Vec<usize> = (0..values.len()).step_by((values.len() / 64).max(1)).collect();

    let start = Instant::now();
    for _ in 0..loops {
        for &index in &samples {
            let value: u32 = engine.select(layout, compressed, index);
            if value != values[index] {
                return Err(format!("{strategy} select returned {value} at {index}").into());
            }
        }
    }
    let select = start.elapsed();

    let start = Instant::now();
    for _ in 0..loops {
        for &index in &samples {
            let (position, _) = engine.search(layout, compressed, values.len(), values[index]);
            if values.get(position) != Some(&values[index]) {
                return Err(format!("{strategy} search returned position {position} for {}", values[index]).into());
            }
        }
    }
    let search = start.elapsed();

    Ok(Measurement {
        strategy,
        samples: samples.len() * loops,
        decode,
        select,
        search,
    })
}

/// Runs the benchmark for every size and prints one line per strategy.
#[tracing::instrument]
pub fn run(sizes: &[usize], loops: usize) -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let loops = loops.max(1);

    println!(
        "{:>10} {:<10} {:<8} {:<7} {:>14} {:>12} {:>14} {:>14}",
        "size", "input", "layout", "decoder", "s/loop", "Mints/s", "select ns/op", "search ns/op"
    );

    for &size in sizes {
        for dataset in datasets(size, &mut rng) {
            for layout in [Layout::Unsorted, Layout::Sorted] {
                let compressed = codec::encode(layout, &dataset.values);
                tracing::debug!(
                    size,
                    input = dataset.name,
                    %layout,
                    bytes = compressed.len(),
                    "compressed benchmark input"
                );

                for strategy in Strategy::ALL {
                    let measurement = measure(strategy, layout, &dataset.values, &compressed, loops)?;
                    print_measurement(size, dataset.name, layout, loops, &measurement);
                }
            }
        }
    }

    Ok(())
}

fn print_measurement(size: usize, input: &str, layout: Layout, loops: usize, measurement: &Measurement) {
    let seconds_per_loop = measurement.decode.as_secs_f64() / loops as f64;
    let throughput = if seconds_per_loop > 0.0 {
        size as f64 / seconds_per_loop / 1e6
    } else {
        f64::INFINITY
    };
    let samples = measurement.samples.max(1);
    let nanos_per = |elapsed: Duration| elapsed.as_nanos() as f64 / samples as f64;

    println!(
        "{:>10} {:<10} {:<8} {:<7} {:>14.9} {:>12.1} {:>14.1} {:>14.1}",
        size,
        input,
        layout,
        measurement.strategy,
        seconds_per_loop,
        throughput,
        nanos_per(measurement.select),
        nanos_per(measurement.search),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 ; "empty")]
    #[test_case(16 ; "one block")]
    #[test_case(1000 ; "one thousand")]
    fn datasets_are_strictly_increasing(size: usize) {
        let mut rng = StdRng::seed_from_u64(SEED);
        for dataset in datasets(size, &mut rng) {
            assert_eq!(dataset.values.len(), size);
            assert!(dataset.values.windows(2).all(|pair| pair[0] < pair[1]), "{}", dataset.name);
        }
    }

    #[test]
    fn every_strategy_measures_correctly() {
        let mut rng = StdRng::seed_from_u64(SEED);
        for dataset in datasets(200, &mut rng) {
            for layout in [Layout::Unsorted, Layout::Sorted] {
                let compressed = codec::encode(layout, &dataset.values);
                for strategy in Strategy::ALL {
                    let measurement = measure(strategy, layout, &dataset.values, &compressed, 2).unwrap();
                    assert_eq!(measurement.strategy, strategy);
                }
            }
        }
    }

    #[test]
    fn run_small_sizes() {
        run(&[0, 17, 100], 1).unwrap();
    }
}
