//! Extract command implementation.

use crate::utils::{create_progress_bar, matches_filters, open_archive};
use oxiar_archive::ExtractOptions;
use std::path::Path;

/// Options for extracting archive members.
pub struct ExtractArgs<'a> {
    pub destination: &'a Path,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub verbose: bool,
    pub progress: bool,
    pub preserve_time: bool,
}

pub fn cmd_extract(archive: &Path, args: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, ar) = open_archive(archive)?;
    std::fs::create_dir_all(args.destination)?;

    let options = ExtractOptions {
        preserve_mtime: args.preserve_time,
        ..ExtractOptions::default()
    };

    let to_extract: Vec<_> = ar
        .headers()
        .iter()
        .filter(|h| matches_filters(h.name(), args.include, args.exclude))
        .collect();
    tracing::debug!(
        selected = to_extract.len(),
        total = ar.headers().len(),
        "filtered members"
    );

    if args.verbose {
        println!(
            "Extracting {} to {}",
            archive.display(),
            args.destination.display()
        );
    }

    let pb = create_progress_bar(to_extract.len() as u64, args.progress);
    pb.set_message("members");

    for header in to_extract {
        let path = ar.extract_file(header, args.destination, &options)?;
        if args.verbose {
            pb.println(format!(
                "  Extracted: {} ({} bytes)",
                path.display(),
                header.size()
            ));
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    Ok(())
}
