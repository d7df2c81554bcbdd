//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxiar_archive::{Archive, ArchiveFormat};
use oxiar_core::Entry;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Open an archive file, rejecting `ar` flavours that cannot be read.
pub fn open_archive(
    path: &Path,
) -> Result<(ArchiveFormat, Archive<BufReader<File>>), Box<dyn std::error::Error>> {
    let (format, _) = ArchiveFormat::detect(&mut File::open(path)?)?;
    if matches!(format, ArchiveFormat::Thin | ArchiveFormat::AixBig) {
        return Err(format!("{}: unsupported archive format: {}", path.display(), format).into());
    }
    // Unknown magic is reported by the archive itself
    let archive = Archive::open(path)?;
    Ok((format, archive))
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Check if a member name matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }

    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(entries: &[Entry], include: &[String], exclude: &[String]) -> Vec<Entry> {
    if include.is_empty() && exclude.is_empty() {
        return entries.to_vec();
    }

    entries
        .iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .cloned()
        .collect()
}

/// Print entries, one name per line or as a table.
pub fn print_entries(entries: &[Entry], verbose: bool) {
    if verbose {
        println!(
            "{:<10} {:>11} {:>10} {:>12}  Name",
            "Mode", "Owner", "Size", "Modified",
        );
        println!("{}", "-".repeat(60));

        let mut total_size = 0u64;
        for entry in entries {
            println!(
                "{:<10} {:>11} {:>10} {:>12}  {}",
                entry.attributes.permissions(),
                format!("{}/{}", entry.attributes.uid, entry.attributes.gid),
                entry.size,
                entry.mtime().unwrap_or(0),
                entry.name
            );
            total_size += entry.size;
        }

        println!("{}", "-".repeat(60));
        println!(
            "{:<10} {:>11} {:>10} {:>12}  {} members",
            "",
            "",
            total_size,
            "",
            entries.len()
        );
    } else {
        for entry in entries {
            println!("{}", entry.name);
        }
    }
}
