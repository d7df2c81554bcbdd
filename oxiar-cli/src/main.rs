//! OxiAr CLI - The Oxidized ar
//!
//! A Pure Rust utility to list, extract and merge Unix `ar` archives.

mod commands;
mod utils;

use clap::{ArgGroup, Parser, ValueEnum};
use commands::{ExtractArgs, ListOptions, cmd_extract, cmd_list, cmd_merge};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "oxiar")]
#[command(author, version, about = "The Oxidized ar - Pure Rust ar archive utility")]
#[command(long_about = "
OxiAr reads, extracts and merges Unix ar archives (static libraries,
Debian packages), including GNU extended filenames.

Examples:
  oxiar --list libfoo.a
  oxiar --list --verbose libfoo.a
  oxiar --extract --destination out libfoo.a
  oxiar --extract -I '*.o' libfoo.a
  oxiar --merge libbar.a --merge libbaz.a libfoo.a
")]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["list", "extract", "merge"])
))]
struct Cli {
    /// List member names
    #[arg(short, long)]
    list: bool,

    /// Extract every member into the destination directory
    #[arg(short = 'x', long)]
    extract: bool,

    /// Append the members of SOURCE to the archive (repeatable)
    #[arg(short, long, value_name = "SOURCE")]
    merge: Vec<PathBuf>,

    /// Output directory for --extract
    #[arg(short, long, default_value = ".")]
    destination: PathBuf,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output the listing as JSON (machine-readable)
    #[arg(short, long)]
    json: bool,

    /// Include only members matching pattern (glob syntax: *.o)
    #[arg(short = 'I', long)]
    include: Vec<String>,

    /// Exclude members matching pattern (glob syntax)
    #[arg(short = 'X', long)]
    exclude: Vec<String>,

    /// Restore member modification times on extraction
    #[arg(long)]
    preserve_time: bool,

    /// Show progress bar while extracting
    #[arg(short = 'P', long)]
    progress: bool,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Archive file
    archive: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = if cli.list {
        let options = ListOptions {
            verbose: cli.verbose,
            json: cli.json,
            include: &cli.include,
            exclude: &cli.exclude,
        };
        cmd_list(&cli.archive, &options)
    } else if cli.extract {
        let args = ExtractArgs {
            destination: &cli.destination,
            include: &cli.include,
            exclude: &cli.exclude,
            verbose: cli.verbose,
            progress: cli.progress,
            preserve_time: cli.preserve_time,
        };
        cmd_extract(&cli.archive, &args)
    } else {
        cmd_merge(&cli.archive, &cli.merge, cli.verbose)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_list_mode() {
        let cli = Cli::try_parse_from(["oxiar", "--list", "libfoo.a"]).unwrap();
        assert!(cli.list);
        assert!(!cli.extract);
        assert!(cli.merge.is_empty());
        assert_eq!(cli.archive, PathBuf::from("libfoo.a"));
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_extract_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["oxiar", "-x", "libfoo.a"]).unwrap();
        assert!(cli.extract);
        assert_eq!(cli.destination, PathBuf::from("."));

        let cli = Cli::try_parse_from(["oxiar", "-x", "-d", "out", "libfoo.a"]).unwrap();
        assert_eq!(cli.destination, PathBuf::from("out"));
    }

    #[test]
    fn test_merge_repeatable() {
        let cli =
            Cli::try_parse_from(["oxiar", "-m", "a.a", "--merge", "b.a", "libfoo.a"]).unwrap();
        assert_eq!(cli.merge, [PathBuf::from("a.a"), PathBuf::from("b.a")]);
    }

    #[test]
    fn test_mode_required() {
        let err = Cli::try_parse_from(["oxiar", "libfoo.a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_modes_exclusive() {
        let err = Cli::try_parse_from(["oxiar", "--list", "--extract", "libfoo.a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = Cli::try_parse_from(["oxiar", "-l", "-m", "b.a", "libfoo.a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_archive_required() {
        let err = Cli::try_parse_from(["oxiar", "--list"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["oxiar", "--list", "a.a", "b.a"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_filters_and_log_level() {
        let cli = Cli::try_parse_from([
            "oxiar",
            "-x",
            "-I",
            "*.o",
            "-X",
            "test_*",
            "--preserve-time",
            "--log-level",
            "debug",
            "libfoo.a",
        ])
        .unwrap();
        assert_eq!(cli.include, ["*.o"]);
        assert_eq!(cli.exclude, ["test_*"]);
        assert!(cli.preserve_time);
        assert_eq!(Level::from(cli.log_level), Level::DEBUG);
    }
}
