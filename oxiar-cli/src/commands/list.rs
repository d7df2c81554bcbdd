//! List command implementation.

use crate::utils::{filter_entries, open_archive, print_entries};
use oxiar_core::{ArchiveReader, Entry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable member data for archive listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    name: String,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtime: Option<u64>,
    uid: u32,
    gid: u32,
    mode: String,
    offset: u64,
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            mtime: entry.mtime(),
            uid: entry.attributes.uid,
            gid: entry.attributes.gid,
            mode: format!("{:o}", entry.attributes.mode),
            offset: entry.offset,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveListJson {
    archive: String,
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name_table_size: Option<u64>,
    has_symbol_index: bool,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (format, mut ar) = open_archive(archive)?;
    let filtered = filter_entries(&ar.entries()?, options.include, options.exclude);

    if options.json {
        let output = ArchiveListJson {
            archive: archive.display().to_string(),
            format: format.to_string(),
            name_table_size: ar.name_table().map(|h| h.size()),
            has_symbol_index: ar.symbol_index().is_some(),
            entries: filtered.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if options.verbose {
        println!("Archive: {} ({})", archive.display(), format);
        println!();
    }
    print_entries(&filtered, options.verbose);

    Ok(())
}
