//! DiskTally — console presenter for the self-refreshing disk usage tree.
//!
//! Thin binary entry point. All scanning logic lives in `disktally-core`;
//! this file only polls published state, formats it and drains the error
//! channel.

mod format;

use anyhow::Context;
use clap::Parser;
use disktally_core::analysis::{export_csv, export_json, largest_dirs, UsageReport};
use disktally_core::scanner::report::ErrorLog;
use disktally_core::{CalcState, DirNode, ScanConfig, ScanContext};
use format::{Count, Share, Size};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// How often the live progress line is redrawn while the root is calculating.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "disktally", version, about = "Recursive disk usage, tallied in parallel")]
struct Cli {
    /// Directory to tally (default: current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Scan worker threads (default: one per CPU)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Levels of the tree to print below the root
    #[arg(short = 'd', long, default_value_t = 1)]
    depth: usize,

    /// Also list the N directories holding the most bytes directly
    #[arg(long, value_name = "N")]
    top: Option<usize>,

    /// Do not descend into directories on other filesystems
    #[arg(short = 'x', long)]
    one_file_system: bool,

    /// Write the full tree as JSON to this file
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Write one CSV row per directory to this file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the report on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ScanConfig::default();
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    config.one_file_system = cli.one_file_system;

    let path = std::fs::canonicalize(&cli.path)
        .with_context(|| format!("cannot resolve {}", cli.path.display()))?;

    let ctx = ScanContext::local(config)?;
    let errors = ctx.error_log();
    let started = Instant::now();
    let root = ctx.scan(path);

    while !root.wait_idle(PROGRESS_INTERVAL) {
        print_errors(&errors);
        eprint!(
            "\rcalculating - {} ({} dirs)   ",
            Size(root.total_size()),
            Count(ctx.stats().dirs_scanned)
        );
    }
    eprintln!();
    print_errors(&errors);

    println!("{:>10}  {:>4}  {}", Size(root.total_size()), "", root.path().display());
    print_children(&root, 1, cli.depth);

    let needs_report = cli.top.is_some() || cli.json.is_some() || cli.csv.is_some();
    if needs_report {
        let report = UsageReport::capture(&root, None);

        if let Some(n) = cli.top {
            println!();
            println!("Largest directories by direct content:");
            for dir in largest_dirs(&report.root, n) {
                println!("{:>10}  {}", Size(dir.direct_file_size), dir.path.display());
            }
        }
        if let Some(file) = &cli.json {
            export_json(&report, file)
                .with_context(|| format!("cannot write {}", file.display()))?;
            tracing::info!("Exported JSON to {}", file.display());
        }
        if let Some(file) = &cli.csv {
            export_csv(&report.root, file)
                .with_context(|| format!("cannot write {}", file.display()))?;
            tracing::info!("Exported CSV to {}", file.display());
        }
    }

    let stats = ctx.stats();
    eprintln!(
        "{} directories in {:.1?}, {} unreadable, {} failed",
        Count(stats.dirs_scanned),
        started.elapsed(),
        Count(stats.listing_failures),
        Count(stats.faults)
    );

    Ok(())
}

fn print_errors(errors: &ErrorLog) {
    for report in errors.drain() {
        eprintln!("\r{report}");
    }
}

fn print_children(node: &DirNode, level: usize, max_depth: usize) {
    if level > max_depth {
        return;
    }
    let whole = node.total_size();
    for child in node.children_by_size() {
        let tag = match child.state() {
            CalcState::Idle if child.last_scan_failed() => "  [unreadable]".to_string(),
            CalcState::Idle => String::new(),
            state => format!("  [{state}]"),
        };
        let size = child.total_size();
        println!(
            "{:>10}  {:>4}  {}{}{}",
            Size(size),
            Share { part: size, whole },
            "  ".repeat(level),
            child.name(),
            tag
        );
        print_children(&child, level + 1, max_depth);
    }
}
