//! gcp - Graceful Copy
//!
//! Recursive copy command powered by gracefs.

use clap::{Parser, ValueEnum};
use gracefs::{CopyBuilder, CopyStats, Error as GracefsError};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// gcp - Graceful copy
///
/// Copy a file, symlink or directory tree. Existing files are replaced unless
/// --no-clobber is given; symlinks are re-created unless --dereference is
/// given.
///
/// Usage:
///   gcp [OPTIONS] SOURCE DEST
#[derive(Parser, Debug)]
#[command(name = "gcp", version, about, long_about = None)]
struct Args {
    /// Source file, symlink or directory
    source: PathBuf,

    /// Destination path (missing parents are created)
    dest: PathBuf,

    /// Keep existing destination files
    #[arg(short = 'n', long)]
    no_clobber: bool,

    /// With --no-clobber, fail on an existing file instead of skipping it
    #[arg(long)]
    error_on_exist: bool,

    /// Copy access and modification times onto copied files
    #[arg(short = 'p', long)]
    preserve_timestamps: bool,

    /// Follow symlinks in SOURCE instead of re-creating them
    #[arg(short = 'L', long)]
    dereference: bool,

    /// Skip entries with this file name (repeatable)
    #[arg(long, value_name = "NAME")]
    exclude: Vec<OsString>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    output: OutputMode,

    /// Disable the spinner
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
enum CliError {
    #[error("--error-on-exist only applies together with -n/--no-clobber")]
    ErrorOnExistWithoutNoClobber,

    #[error("--exclude takes a single file name, not a path: {name}")]
    ExcludeIsPath { name: String },

    #[error("Source does not exist: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to copy {path}: {source}")]
    Copy { path: PathBuf, source: GracefsError },

    #[error("Failed to serialize JSON output: {source}")]
    JsonSerialize { source: serde_json::Error },
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::ErrorOnExistWithoutNoClobber | Self::ExcludeIsPath { .. } => "invalid_input",
            Self::SourceNotFound { .. } => "source_not_found",
            Self::Copy { source, .. } => source.code(),
            Self::JsonSerialize { .. } => "internal",
        }
    }

    fn exit_code(&self) -> i32 {
        match self.code() {
            "invalid_input" => 2,
            _ => 1,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing();

    if let Err(error) = run(&args) {
        eprintln!("error[{}]: {}", error.code(), error);
        std::process::exit(error.exit_code());
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or gracefs
/// debug events when `GRACEFS_DEBUG` is on.
fn init_tracing() {
    let default = if gracefs::trace::enabled() {
        "gracefs=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> CliResult<()> {
    let builder = build_copy(args)?;

    if let Err(e) = std::fs::symlink_metadata(&args.source) {
        if e.kind() == io::ErrorKind::NotFound {
            return Err(CliError::SourceNotFound {
                path: args.source.clone(),
            });
        }
    }

    if args.verbose && args.output == OutputMode::Human {
        eprintln!("Options: {:?}", builder.options());
    }

    let pb = spinner(args);
    let result = builder.run();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match result {
        Ok(stats) => {
            match args.output {
                OutputMode::Human => print_stats(&stats, args.verbose),
                OutputMode::Json => print_json_value(&success_record(args, &stats))?,
            }
            Ok(())
        }
        Err(source) => {
            if args.output == OutputMode::Json {
                print_json_value(&failure_record(args, &source))?;
            }
            Err(CliError::Copy {
                path: args.source.clone(),
                source,
            })
        }
    }
}

fn build_copy(args: &Args) -> CliResult<CopyBuilder> {
    if args.error_on_exist && !args.no_clobber {
        return Err(CliError::ErrorOnExistWithoutNoClobber);
    }
    if let Some(name) = args
        .exclude
        .iter()
        .find(|name| Path::new(name).components().count() != 1)
    {
        return Err(CliError::ExcludeIsPath {
            name: name.to_string_lossy().into_owned(),
        });
    }

    let mut builder = CopyBuilder::new(&args.source, &args.dest);
    if args.no_clobber {
        builder = builder.no_clobber();
    }
    if args.error_on_exist {
        builder = builder.error_on_exist();
    }
    if args.preserve_timestamps {
        builder = builder.preserve_timestamps();
    }
    if args.dereference {
        builder = builder.dereference();
    }
    if !args.exclude.is_empty() {
        let excluded = args.exclude.clone();
        builder = builder.filter(move |src, _dest| {
            src.file_name()
                .is_none_or(|name| !excluded.iter().any(|ex| ex == name))
        });
    }
    Ok(builder)
}

fn spinner(args: &Args) -> Option<ProgressBar> {
    if args.output != OutputMode::Human || args.quiet {
        return None;
    }
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .ok()?;
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Copying {}...", args.source.display()));
    Some(pb)
}

fn stats_value(stats: &CopyStats) -> Value {
    json!({
        "files_copied": stats.files_copied,
        "files_skipped": stats.files_skipped,
        "dirs_created": stats.dirs_created,
        "symlinks_copied": stats.symlinks_copied,
        "entries_filtered": stats.entries_filtered,
        "bytes_copied": stats.bytes_copied,
        "duration_ms": u64::try_from(stats.duration.as_millis()).unwrap_or(u64::MAX),
    })
}

fn success_record(args: &Args, stats: &CopyStats) -> Value {
    json!({
        "schema_version": "1.0",
        "source": display_path(&args.source),
        "destination": display_path(&args.dest),
        "outcome": "copied",
        "stats": stats_value(stats),
    })
}

fn failure_record(args: &Args, error: &GracefsError) -> Value {
    json!({
        "schema_version": "1.0",
        "source": display_path(&args.source),
        "destination": display_path(&args.dest),
        "outcome": "failed",
        "error_code": error.code(),
        "error_message": error.to_string(),
    })
}

fn print_stats(stats: &CopyStats, verbose: bool) {
    if stats.files_copied == 0 && stats.symlinks_copied == 0 && stats.dirs_created == 0 {
        if stats.files_skipped > 0 {
            println!(
                "Nothing to copy ({} files already exist)",
                stats.files_skipped
            );
        } else {
            println!("Nothing to copy");
        }
        return;
    }

    let bytes_str = format_bytes(stats.bytes_copied);

    if verbose {
        println!("Copy completed in {:?}", stats.duration);
        println!("  Files copied:   {}", stats.files_copied);
        println!("  Files skipped:  {}", stats.files_skipped);
        println!("  Symlinks:       {}", stats.symlinks_copied);
        println!("  Directories:    {}", stats.dirs_created);
        println!("  Filtered out:   {}", stats.entries_filtered);
        println!("  Total size:     {}", bytes_str);
    } else {
        let mut parts = vec![];
        if stats.files_copied > 0 {
            parts.push(format!("{} files", stats.files_copied));
        }
        if stats.symlinks_copied > 0 {
            parts.push(format!("{} symlinks", stats.symlinks_copied));
        }
        if stats.dirs_created > 0 {
            parts.push(format!("{} dirs", stats.dirs_created));
        }
        println!("Copied {} ({})", parts.join(", "), bytes_str);
    }
}

fn print_json_value(value: &Value) -> CliResult<()> {
    let serialized =
        serde_json::to_string(value).map_err(|source| CliError::JsonSerialize { source })?;
    println!("{serialized}");
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
