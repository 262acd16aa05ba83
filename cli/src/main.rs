// Copyright 2024 Logan Magee
//
// SPDX-License-Identifier: LicenseRef-Proprietary

use std::{fs, fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use slidetree::{
    ByteSource, CollisionResolution, ElmMethod, Endianness, Representation, SlidingConfig,
    Variation,
};
use suftree::{Symbol, traversal};

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a suffix tree over a whole file
    Static {
        input: PathBuf,
        /// Length of the prefixes suffixes are partitioned by [default: derived from the size]
        #[arg(long)]
        prefix_length: Option<usize>,
        /// Check the structure of the tree after building it
        #[arg(long)]
        validate: bool,
    },
    /// Slide a suffix tree over a file
    Stream {
        input: PathBuf,
        #[arg(long, default_value_t = SlidingConfig::DEFAULT_BLOCK_SIZE)]
        block_size: usize,
        #[arg(long, default_value_t = SlidingConfig::DEFAULT_AP_SCALE_FACTOR)]
        ap_scale_factor: usize,
        /// [default: twice the active part for batch updates, two blocks more otherwise]
        #[arg(long)]
        sw_scale_factor: Option<usize>,
        #[arg(long, value_enum, default_value_t = Method::Batch)]
        elm_method: Method,
        #[arg(long, value_enum, default_value_t = Simulation::TopDown)]
        variation: Simulation,
        #[arg(long, value_enum, default_value_t = Nodes::Shti)]
        representation: Nodes,
        #[arg(long, value_enum, default_value_t = Collisions::Cuckoo)]
        collision_resolution: Collisions,
        #[arg(long, default_value_t = SlidingConfig::DEFAULT_CUCKOO_HASH_FUNCTIONS)]
        hash_functions: usize,
        /// Read blocks on a separate thread
        #[arg(long)]
        reader_thread: bool,
        /// Width of a symbol in bytes
        #[arg(long, value_parser = ["1", "2", "4"], default_value = "1")]
        width: String,
        /// Decode wide symbols as big endian instead of little endian
        #[arg(long)]
        big_endian: bool,
        /// Check the structure of the tree after every block
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Batch,
    Credit,
}

#[derive(Clone, Copy, ValueEnum)]
enum Simulation {
    TopDown,
    BottomUp,
}

#[derive(Clone, Copy, ValueEnum)]
enum Nodes {
    Slli,
    Shti,
}

#[derive(Clone, Copy, ValueEnum)]
enum Collisions {
    Cuckoo,
    DoubleHashing,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Static {
            input,
            prefix_length,
            validate,
        } => {
            let text = fs::read(&input)
                .with_context(|| format!("Failed to read input file '{}'", input.display()))?;
            let tree = suftree::build_pwotd(prefix_length, &text)
                .context("Failed to build suffix tree")?;
            if validate {
                traversal::validate(&tree).context("Suffix tree is inconsistent")?;
            }

            println!(
                "symbols {} leaves {} branches {} prefix-length {} partitions {}",
                text.len(),
                tree.leaf_count(),
                tree.branch_count(),
                tree.prefix_length(),
                tree.partition_count(),
            );
        }
        Command::Stream {
            input,
            block_size,
            ap_scale_factor,
            sw_scale_factor,
            elm_method,
            variation,
            representation,
            collision_resolution,
            hash_functions,
            reader_thread,
            width,
            big_endian,
            validate,
        } => {
            let mut config = SlidingConfig::new();
            config
                .block_size(block_size)
                .ap_scale_factor(ap_scale_factor)
                .sw_scale_factor(sw_scale_factor)
                .elm_method(match elm_method {
                    Method::Batch => ElmMethod::Batch,
                    Method::Credit => ElmMethod::Credit,
                })
                .variation(match variation {
                    Simulation::TopDown => Variation::TopDown,
                    Simulation::BottomUp => Variation::BottomUp,
                })
                .representation(match representation {
                    Nodes::Slli => Representation::Slli,
                    Nodes::Shti => Representation::Shti,
                })
                .collision_resolution(match collision_resolution {
                    Collisions::Cuckoo => CollisionResolution::Cuckoo,
                    Collisions::DoubleHashing => CollisionResolution::DoubleHashing,
                })
                .cuckoo_hash_functions(hash_functions)
                .reader_thread(reader_thread);
            let endianness = if big_endian {
                Endianness::Big
            } else {
                Endianness::Little
            };

            let validate_every = validate.then_some(block_size as u64);

            match width.as_str() {
                "2" => stream::<u16>(&config, input, endianness, validate_every),
                "4" => stream::<u32>(&config, input, endianness, validate_every),
                _ => stream::<u8>(&config, input, endianness, validate_every),
            }?;
        }
    }

    Ok(())
}

fn stream<C: Symbol>(
    config: &SlidingConfig,
    input: PathBuf,
    endianness: Endianness,
    validate_every: Option<u64>,
) -> anyhow::Result<()> {
    let file = File::open(&input)
        .with_context(|| format!("Failed to open input file '{}'", input.display()))?;
    let source = ByteSource::new(BufReader::new(file), endianness);
    let mut tree = slidetree::build_sliding_window_ukkonen::<C, _>(config, source)
        .context("Failed to set up sliding window")?;

    while tree.step().context("Failed to slide suffix tree")? {
        if validate_every.is_some_and(|every| tree.active_range().end % every == 1) {
            traversal::validate(&tree).context("Suffix tree is inconsistent")?;
        }
    }

    let stats = tree.stats();
    println!(
        "prolongs {} deletes {} shortened {} unary {} batches {} credits {} rehashes {} peak-branches {}",
        stats.prolong_steps,
        stats.delete_steps,
        stats.shortened_edges,
        stats.removed_unary_nodes,
        stats.batch_passes,
        stats.credits_sent,
        stats.rehashes,
        stats.peak_branches,
    );

    Ok(())
}
