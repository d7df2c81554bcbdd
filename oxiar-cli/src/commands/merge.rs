//! Merge command implementation.

use crate::utils::open_archive;
use oxiar_archive::Archive;
use std::path::{Path, PathBuf};
use tracing::info;

/// Append the members of every source to `archive`, creating it if needed.
///
/// All sources are staged first and written in a single commit, so a bad
/// source leaves the target untouched.
pub fn cmd_merge(
    archive: &Path,
    sources: &[PathBuf],
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut target = if archive.exists() {
        open_archive(archive)?.1
    } else {
        info!(path = %archive.display(), "creating archive");
        Archive::create(archive)?
    };

    for source in sources {
        let (_, ar) = open_archive(source)?;
        if verbose {
            for name in ar.names() {
                println!("  Staged: {} (from {})", name, source.display());
            }
        }
        target.merge(&ar);
    }

    let staged = target.pending().count();
    target.close()?;

    println!(
        "Merged {} member(s) from {} archive(s) into {}",
        staged,
        sources.len(),
        archive.display()
    );

    Ok(())
}
