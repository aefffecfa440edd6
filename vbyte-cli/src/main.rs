use std::error::Error;
use std::fmt::Display;
use std::io::{BufWriter, Read, Write};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use vbyte::codec;
use vbyte::config::Settings;
use vbyte::{Engine, Layout, VarInt};

mod bench;
mod logging;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogOutputFormat {
    Json,
    Pretty,
}

/// Integer width of a compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Width {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

/// Layout of a compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Unsorted,
    Sorted,
}

impl From<LayoutArg> for Layout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Unsorted => Layout::Unsorted,
            LayoutArg::Sorted => Layout::Sorted,
        }
    }
}

/// Command line arguments for the vbyte tool.
#[derive(Debug, Parser)]
#[clap(name = "vbyte", about = "Variable-byte integer compression")]
struct Cli {
    /// Optional path to the configuration file. If not provided, defaults
    /// and `VBYTE_` environment variables are used.
    #[clap(short = 'c', long, required = false)]
    config: Option<PathBuf>,

    #[clap(short = 'o', long = "output-format", default_value = "pretty")]
    output_format: Option<LogOutputFormat>,

    #[clap(subcommand)]
    command: Command,
}

/// Describes a compressed stream.
#[derive(Debug, clap::Args)]
struct StreamArgs {
    /// Integer width in bits.
    #[clap(long, default_value = "32")]
    width: Width,

    /// Whether the stream holds values or deltas.
    #[clap(long, default_value = "unsorted")]
    layout: LayoutArg,

    /// Input file; stdin when omitted.
    #[clap(short, long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress whitespace separated integers into a raw stream.
    Compress {
        #[clap(flatten)]
        stream: StreamArgs,

        /// Output file; stdout when omitted.
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the first `count` integers of a raw stream, one per line.
    Decompress {
        #[clap(flatten)]
        stream: StreamArgs,

        #[clap(short = 'n', long)]
        count: usize,
    },
    /// Print the integer at a position of a raw stream.
    Select {
        #[clap(flatten)]
        stream: StreamArgs,

        #[clap(long)]
        index: usize,
    },
    /// Search the first `count` integers of a raw stream: an exact match for
    /// the unsorted layout, the first value not below the target for the
    /// sorted one.
    Search {
        #[clap(flatten)]
        stream: StreamArgs,

        #[clap(short = 'n', long)]
        count: usize,

        #[clap(long)]
        target: String,
    },
    /// Time every decode strategy on generated inputs.
    Bench {
        /// Number of values per input.
        #[clap(long, value_delimiter = ',', default_value = "1000,100000,1000000")]
        sizes: Vec<usize>,

        /// Timed repetitions per strategy.
        #[clap(long, default_value = "10")]
        loops: usize,
    },
}

/// The integer types the tool reads and prints.
trait Integer: VarInt + Display + FromStr<Err = ParseIntError> {}

impl Integer for u32 {}
impl Integer for u64 {}

/// Runs `$body` with `$ty` bound to the integer type of `$width`.
macro_rules! with_width {
    ($width:expr, $ty:ident => $body:expr) => {
        match $width {
            Width::W32 => {
                type $ty = u32;
                $body
            }
            Width::W64 => {
                type $ty = u64;
                $body
            }
        }
    };
}

fn main() -> Result<(), Box<dyn Error>> {
    // Parse the command line arguments.
    let args = Cli::parse();

    // Configure the binary's stderr output based on the provided output format.
    let pretty = matches!(args.output_format, Some(LogOutputFormat::Pretty));
    logging::setup_logging("info,vbyte=debug", pretty);

    // Load the configuration file and/or environment variables.
    let settings = Settings::new(args.config)?;

    vbyte::init();
    let engine = Engine::from_settings(&settings);

    match args.command {
        Command::Compress { stream, output } => with_width!(stream.width, T => {
            compress::<T>(stream.layout.into(), stream.input.as_deref(), output.as_deref())
        }),
        Command::Decompress { stream, count } => with_width!(stream.width, T => {
            decompress::<T>(&engine, stream.layout.into(), stream.input.as_deref(), count)
        }),
        Command::Select { stream, index } => with_width!(stream.width, T => {
            select::<T>(&engine, stream.layout.into(), stream.input.as_deref(), index)
        }),
        Command::Search { stream, count, target } => with_width!(stream.width, T => {
            search::<T>(&engine, stream.layout.into(), stream.input.as_deref(), count, &target)
        }),
        Command::Bench { sizes, loops } => bench::run(&sizes, loops),
    }
}

fn read_input(path: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn parse_values<T: Integer>(text: &str) -> Result<Vec<T>, ParseIntError> {
    text.split_whitespace().map(str::parse).collect()
}

#[tracing::instrument]
fn compress<T: Integer>(
    layout: Layout,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let text = String::from_utf8(read_input(input)?)?;
    let values = parse_values::<T>(&text)?;

    // Deltas of increasing values are never larger than the values.
    let mut compressed = vec![0u8; codec::compressed_size_unsorted(&values)];
    let written = match layout {
        Layout::Unsorted => codec::try_compress_unsorted(&values, &mut compressed)?,
        Layout::Sorted => codec::try_compress_sorted(&values, &mut compressed)?,
    };
    compressed.truncate(written);

    match output {
        Some(path) => std::fs::write(path, &compressed)?,
        None => std::io::stdout().lock().write_all(&compressed)?,
    }

    tracing::info!(values = values.len(), bytes = written, "compressed");
    Ok(())
}

#[tracing::instrument(skip(engine))]
fn decompress<T: Integer>(
    engine: &Engine,
    layout: Layout,
    input: Option<&Path>,
    count: usize,
) -> Result<(), Box<dyn Error>> {
    let compressed = read_input(input)?;
    codec::validate::<T>(&compressed, count)?;

    let mut values = vec![T::ZERO; count];
    let consumed = engine.uncompress(layout, &compressed, &mut values);

    let mut out = BufWriter::new(std::io::stdout().lock());
    for value in &values {
        writeln!(out, "{value}")?;
    }
    out.flush()?;

    tracing::info!(values = count, bytes = consumed, "decompressed");
    Ok(())
}

#[tracing::instrument(skip(engine))]
fn select<T: Integer>(
    engine: &Engine,
    layout: Layout,
    input: Option<&Path>,
    index: usize,
) -> Result<(), Box<dyn Error>> {
    let compressed = read_input(input)?;
    let value: T = select_value(engine, layout, &compressed, index)?;
    println!("{value}");
    Ok(())
}

/// Returns the value at `index` once the stream is known to hold it.
fn select_value<T: Integer>(
    engine: &Engine,
    layout: Layout,
    compressed: &[u8],
    index: usize,
) -> Result<T, Box<dyn Error>> {
    let count = index.checked_add(1).ok_or("index out of range")?;
    codec::validate::<T>(compressed, count)?;
    Ok(engine.select(layout, compressed, index))
}

#[tracing::instrument(skip(engine))]
fn search<T: Integer>(
    engine: &Engine,
    layout: Layout,
    input: Option<&Path>,
    count: usize,
    target: &str,
) -> Result<(), Box<dyn Error>> {
    let target: T = target.parse()?;
    let compressed = read_input(input)?;
    codec::validate::<T>(&compressed, count)?;

    match engine.search(layout, &compressed, count, target) {
        (position, Some(value)) => println!("{position}\t{value}"),
        (position, None) => {
            tracing::debug!(position, "no match");
            println!("{position}\tnone");
        }
    }
    Ok(())
}
