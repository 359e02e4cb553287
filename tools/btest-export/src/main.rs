//! btest-export - m64k test-vector transcoder
//!
//! Converts the gzipped JSON single-instruction test corpus into the
//! compact `.btest` binary format loaded by the m64k conformance harness.
//!
//! # Commands
//!
//! - `btest-export build [DIR]` - convert every `.json.gz` file in a directory
//! - `btest-export convert <INPUT>` - convert a single file
//! - `btest-export info <FILE>` - decode a `.btest` file and print a summary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use btest_export::convert;

#[derive(Parser)]
#[command(name = "btest-export")]
#[command(about = "m64k test-vector transcoder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every .json.gz file in a directory to .btest
    Build {
        /// Directory to scan for .json.gz files
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Convert the remaining files when one fails, instead of stopping
        /// at the first error
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Convert a single .json.gz file
    Convert {
        /// Input .json.gz file
        input: PathBuf,

        /// Output .btest file (default: input with .json.gz replaced by .btest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a .btest file and print a summary
    Info {
        /// .btest file to inspect
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            dir,
            recursive,
            keep_going,
        } => build(&dir, recursive, keep_going),

        Commands::Convert { input, output } => {
            let output = output.unwrap_or_else(|| convert::output_path(&input));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let stats = convert::convert_file(&input, &output)?;
            tracing::info!("Wrote {} tests ({} bytes)", stats.tests, stats.bytes);
            Ok(())
        }

        Commands::Info { file } => info(&file),
    }
}

fn build(dir: &Path, recursive: bool, keep_going: bool) -> Result<()> {
    let inputs = convert::find_inputs(dir, recursive)?;
    if inputs.is_empty() {
        tracing::warn!("No .json.gz files found in {:?}", dir);
        return Ok(());
    }

    let mut failed = 0usize;
    for input in &inputs {
        let output = convert::output_path(input);
        tracing::info!("Converting {:?} -> {:?}", input, output);
        match convert::convert_file(input, &output) {
            Ok(stats) => {
                tracing::info!("Wrote {} tests ({} bytes)", stats.tests, stats.bytes);
            }
            Err(err) if keep_going => {
                tracing::error!("Skipping {:?}: {:#}", input, err);
                failed += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} files failed to convert", failed, inputs.len());
    }
    tracing::info!("Converted {} files", inputs.len());
    Ok(())
}

fn info(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read btest file: {}", file.display()))?;
    let tests = m64k_btest::decode_suite(&bytes)
        .with_context(|| format!("Failed to decode btest file: {}", file.display()))?;

    let ram_pairs: usize = tests
        .iter()
        .map(|t| t.initial.ram.len() + t.final_state.ram.len())
        .sum();

    println!("{}", file.display());
    println!("  tests:     {}", tests.len());
    println!("  ram pairs: {}", ram_pairs);
    println!("  bytes:     {}", bytes.len());
    if let Some(first) = tests.first() {
        println!("  first:     {}", first.name);
    }
    if let Some(last) = tests.last() {
        println!("  last:      {}", last.name);
    }

    Ok(())
}
