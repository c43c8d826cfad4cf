//! Kura CLI - Command-line tool for extracting game resource containers.
//!
//! This is the main entry point for the Kura command-line application.

mod saver;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use kura::fmt::DEFAULT_MAX_DEPTH;
use kura::prelude::*;

use crate::saver::FsSaver;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Kura - game resource container extraction tool
#[derive(Parser)]
#[command(name = "kura")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported formats, in probing order
    Formats,

    /// List the file table of an archive
    List {
        /// Archive to read
        input: PathBuf,

        /// Skip detection and read the input as this format
        #[arg(short, long, env = "KURA_FORMAT")]
        format: Option<String>,

        /// Filter pattern (glob-style)
        #[arg(long)]
        filter: Option<String>,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract archives into a directory
    Unpack {
        /// Archives, or directories to search for archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, env = "KURA_OUTPUT", default_value = ".")]
        output: PathBuf,

        /// Skip detection and read every input as this format
        #[arg(short, long, env = "KURA_FORMAT")]
        format: Option<String>,

        /// Only write files whose name matches this pattern (glob-style)
        #[arg(long)]
        filter: Option<String>,

        /// Keep payloads as extracted instead of decoding them further
        #[arg(long)]
        no_recurse: bool,

        /// Maximum archive nesting depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Do not guess extensions of unrecognized payloads
        #[arg(long)]
        no_guess: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = default_registry().context("Failed to build the format registry")?;

    match cli.command {
        Commands::Formats => {
            cmd_formats(&registry);
        }
        Commands::List {
            input,
            format,
            filter,
            json,
        } => {
            cmd_list(&registry, &input, format, filter.as_deref(), json)?;
        }
        Commands::Unpack {
            inputs,
            output,
            format,
            filter,
            no_recurse,
            max_depth,
            no_guess,
        } => {
            let mut options = DispatchOptions::default()
                .with_recurse(!no_recurse)
                .with_max_depth(max_depth)
                .with_guess_extensions(!no_guess);
            if let Some(format) = format {
                options = options.with_format(format);
            }
            cmd_unpack(&registry, &inputs, &output, options, filter.as_deref())?;
        }
    }

    Ok(())
}

fn cmd_formats(registry: &Registry) {
    for descriptor in registry.descriptors() {
        let kind = if descriptor.instantiate().is_archive() {
            "archive"
        } else {
            "file"
        };
        println!("{:<16} {}", descriptor.name(), kind);
    }
}

fn cmd_list(
    registry: &Registry,
    path: &Path,
    format: Option<String>,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let input = read_input(path)?;

    let mut options = DispatchOptions::default();
    if let Some(format) = format {
        options = options.with_format(format);
    }
    let (format, table) = Dispatcher::with_options(registry, options)
        .list(&input)
        .with_context(|| format!("Failed to read the table of {}", path.display()))?;

    let pattern = filter.map(glob::Pattern::new).transpose()?;
    let entries: Vec<&TableEntry> = table
        .iter()
        .filter(|e| pattern.as_ref().map_or(true, |p| p.matches(&e.name)))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{:>10} {:>10} {}", entry.offset, entry.size, entry.name);
    }
    println!("\nTotal: {} entries ({})", entries.len(), format);

    Ok(())
}

fn cmd_unpack(
    registry: &Registry,
    inputs: &[PathBuf],
    output: &Path,
    options: DispatchOptions,
    filter: Option<&str>,
) -> Result<()> {
    let pattern = filter.map(glob::Pattern::new).transpose()?;
    let archives = collect_inputs(inputs)?;

    // Spread a lone archive's entries over the pool instead.
    let options = options.with_parallel(archives.len() == 1);

    println!("Unpacking {} archives into {}", archives.len(), output.display());

    let pb = ProgressBar::new(archives.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let written = AtomicUsize::new(0);
    let failures: Vec<String> = archives
        .par_iter()
        .filter_map(|path| {
            let result = unpack_one(registry, path, output, &options, pattern.as_ref());
            pb.inc(1);
            match result {
                Ok(count) => {
                    written.fetch_add(count, Ordering::Relaxed);
                    None
                }
                Err(e) => Some(format!("{}: {:#}", path.display(), e)),
            }
        })
        .collect();

    pb.finish_and_clear();
    for failure in &failures {
        eprintln!("Error: {failure}");
    }
    println!(
        "Wrote {} files from {} archives in {:?} ({} failed)",
        written.load(Ordering::Relaxed),
        archives.len() - failures.len(),
        start.elapsed(),
        failures.len()
    );

    if !failures.is_empty() {
        anyhow::bail!("{} of {} archives failed", failures.len(), archives.len());
    }
    Ok(())
}

/// Unpack one archive into its own directory below `output`.
///
/// Nothing is written unless the whole archive decodes.
fn unpack_one(
    registry: &Registry,
    path: &Path,
    output: &Path,
    options: &DispatchOptions,
    pattern: Option<&glob::Pattern>,
) -> Result<usize> {
    let input = read_input(path)?;

    // Detect up front so that a decode error can name the format.
    let dispatcher = Dispatcher::with_options(registry, options.clone());
    let (format, _) = dispatcher.select(&input).context("Unrecognized input")?;
    let dispatcher = Dispatcher::with_options(registry, options.clone().with_format(&format));

    let stem = path.file_stem().unwrap_or(path.as_os_str());
    let mut sink = FsSaver::new(output.join(stem)).with_filter(pattern.cloned());
    let mut buffered = BufferedSaver::new(&mut sink);

    dispatcher
        .dispatch(input, &mut buffered)
        .with_context(|| format!("Failed to decode as {format}"))?;
    buffered
        .commit()
        .with_context(|| format!("Failed to write output of {format}"))?;

    Ok(sink.written())
}

fn read_input(path: &Path) -> Result<RawFile> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(RawFile::new(name, data))
}

/// Expand directories into the files below them, in a stable order.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}
