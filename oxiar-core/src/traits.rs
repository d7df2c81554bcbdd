//! Core traits for archive access.

use crate::entry::Entry;
use crate::error::{OxiArError, Result};
use std::io::Write;

/// An archive reader that can list and extract entries.
///
/// Implemented by archive format handlers so front ends can stay generic
/// over the container.
pub trait ArchiveReader {
    /// Get the list of entries in the archive, in archive order.
    fn entries(&mut self) -> Result<Vec<Entry>>;

    /// Extract a specific entry.
    ///
    /// # Arguments
    ///
    /// * `entry` - The entry to extract
    /// * `writer` - Where to write the extracted data
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    fn extract<W: Write>(&mut self, entry: &Entry, writer: &mut W) -> Result<u64>;

    /// Extract the first entry called `name`.
    fn extract_by_name<W: Write>(&mut self, name: &str, writer: &mut W) -> Result<u64> {
        let entry = self
            .entry_by_name(name)?
            .ok_or_else(|| OxiArError::entry_not_found(name))?;
        self.extract(&entry, writer)
    }

    /// Get an entry by name.
    fn entry_by_name(&mut self, name: &str) -> Result<Option<Entry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().find(|e| e.name == name))
    }
}
