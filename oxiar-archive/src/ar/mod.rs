//! Unix `ar` archive support.
//!
//! This module reads, extracts and merges `ar` archives with support for:
//! - The common 60-byte member header
//! - GNU extended filenames (`//` table, `/<offset>` references)
//! - Recognition of the `/` and `/SYM64/` symbol indexes (not decoded)
//!
//! Opening an archive walks its headers once and keeps them in memory;
//! payloads are only read on extraction or when a merge is committed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxiar_archive::ar::Archive;
//!
//! let archive = Archive::open("libfoo.a").unwrap();
//! for name in archive.names() {
//!     println!("{}", name);
//! }
//! archive.extract("out").unwrap();
//! ```

mod header;
mod merge;
mod names;
mod stream;

pub use header::{Header, HeaderKind};
pub use stream::ContentStream;

use merge::Pending;
use names::NameTable;
use oxiar_core::error::{OxiArError, Result};
use oxiar_core::{ArchiveReader, Entry};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, warn};

/// Global archive magic.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";

/// Bytes closing every member header.
pub const TERMINATOR: &[u8; 2] = b"`\n";

/// Size of a member header.
pub const HEADER_LEN: usize = 60;

/// Width of the inline name field.
pub const NAME_LEN: usize = 16;

/// Width of the modification time field.
pub const MTIME_LEN: usize = 12;

/// Width of the owner id field.
pub const UID_LEN: usize = 6;

/// Width of the group id field.
pub const GID_LEN: usize = 6;

/// Width of the mode field.
pub const MODE_LEN: usize = 8;

/// Width of the size field.
pub const SIZE_LEN: usize = 10;

/// Name of the symbol index member.
pub const SYMBOL_INDEX: &str = "/";

/// Name of the 64-bit GNU symbol index member.
pub const SYMBOL_INDEX_64: &str = "/SYM64/";

/// Name of the extended filename table member.
pub const NAME_TABLE: &str = "//";

/// Byte written after odd-sized payloads.
pub const PAD_BYTE: u8 = b'\n';

/// Mode given to members staged from memory.
pub const DEFAULT_MODE: u32 = 0o100644;

/// Options for [`Archive::extract_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Set each extracted file's modification time from its header.
    pub preserve_mtime: bool,
    /// Size of the copy buffer.
    pub buffer_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            preserve_mtime: false,
            buffer_size: 8192,
        }
    }
}

/// An `ar` archive over a seekable stream.
///
/// The archive owns its backing stream; content streams borrow it one at a
/// time. Entries staged with [`Archive::merge`] or [`Archive::stage_bytes`]
/// are only written when the archive is committed.
pub struct Archive<R: Read + Seek> {
    stream: Rc<RefCell<R>>,
    path: Option<PathBuf>,
    len: u64,
    headers: Vec<Header>,
    symbol_index: Option<Header>,
    name_table: Option<Header>,
    pending: Vec<Pending>,
}

impl Archive<BufReader<File>> {
    /// Open the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::new(BufReader::new(file))?;
        archive.path = Some(path.to_path_buf());
        debug!(path = %path.display(), members = archive.headers.len(), "opened archive");
        Ok(archive)
    }

    /// Create an empty archive at `path` and open it.
    ///
    /// Fails if the file already exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(MAGIC)?;
        file.sync_all()?;
        drop(file);
        Self::open(path)
    }

    /// Path of the backing file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Commit staged entries, then release the archive.
    pub fn close(mut self) -> Result<()> {
        self.commit()
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Index an archive starting at the current position of `reader`.
    ///
    /// The archive takes ownership of the reader; pass `&mut reader` to lend
    /// a stream instead.
    pub fn new(mut reader: R) -> Result<Self> {
        let start = reader.stream_position()?;
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let mut magic = Vec::with_capacity(MAGIC.len());
        reader
            .by_ref()
            .take(MAGIC.len() as u64)
            .read_to_end(&mut magic)?;
        if magic != MAGIC {
            return Err(OxiArError::bad_archive_magic(MAGIC.to_vec(), magic));
        }

        let mut archive = Self {
            stream: Rc::new(RefCell::new(reader)),
            path: None,
            len,
            headers: Vec::new(),
            symbol_index: None,
            name_table: None,
            pending: Vec::new(),
        };
        archive.index(start + MAGIC.len() as u64)?;
        Ok(archive)
    }

    /// Walk every header from `position` to the end of the stream.
    fn index(&mut self, mut position: u64) -> Result<()> {
        let mut reader = self.stream.borrow_mut();

        while position < self.len {
            let names = self.name_table.as_ref().map(NameTable::from_header);
            let header = Header::read(&mut *reader, names.as_ref())?;

            let payload_end = header.offset() + header.size();
            if payload_end > self.len {
                return Err(OxiArError::truncated(payload_end - self.len));
            }
            position = header.next_position();

            match header.kind() {
                HeaderKind::SymbolIndex => {
                    debug!(size = header.size(), "found symbol index");
                    self.symbol_index = Some(header);
                }
                HeaderKind::NameTable => {
                    if self.name_table.is_some() {
                        warn!(
                            position = header.position(),
                            "archive has more than one filename table, using the last"
                        );
                    }
                    debug!(size = header.size(), "found filename table");
                    self.name_table = Some(header);
                }
                HeaderKind::Member => self.headers.push(header),
            }
            reader.seek(SeekFrom::Start(position))?;
        }

        Ok(())
    }

    /// Visible members, in archive order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Names of the visible members, in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(Header::name)
    }

    /// Names of the visible members, in archive order.
    pub fn list(&self) -> Vec<String> {
        self.names().map(str::to_owned).collect()
    }

    /// First visible member called `name`.
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.name() == name)
    }

    /// The symbol index header, if the archive has one.
    pub fn symbol_index(&self) -> Option<&Header> {
        self.symbol_index.as_ref()
    }

    /// The extended filename table header, if the archive has one.
    pub fn name_table(&self) -> Option<&Header> {
        self.name_table.as_ref()
    }

    /// Size of the backing stream when the archive was indexed.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the archive has no visible member.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Open a bounded reader over the payload of `header`.
    ///
    /// Only one content stream may be open on an archive at a time; a second
    /// attempt fails with [`OxiArError::StreamBusy`].
    pub fn open_entry(&self, header: &Header) -> Result<ContentStream<'_, R>> {
        let reader = self
            .stream
            .try_borrow_mut()
            .map_err(|_| OxiArError::StreamBusy)?;
        ContentStream::new(reader, header)
    }

    /// Extract one member to a writer.
    pub fn extract_entry<W: Write>(&self, header: &Header, writer: &mut W) -> Result<u64> {
        self.copy_entry(header, writer, ExtractOptions::default().buffer_size)
    }

    /// Extract one member to a Vec.
    pub fn extract_to_vec(&self, header: &Header) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(usize::try_from(header.size()).unwrap_or(0));
        self.extract_entry(header, &mut data)?;
        Ok(data)
    }

    /// Extract the first member called `name`.
    pub fn extract_by_name(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.header(name) {
            Some(header) => Ok(Some(self.extract_to_vec(header)?)),
            None => Ok(None),
        }
    }

    /// Write every visible member to `<destination>/<name>`.
    ///
    /// The destination directory must exist. Files extracted before a
    /// failure are left in place.
    pub fn extract(&self, destination: impl AsRef<Path>) -> Result<()> {
        self.extract_with(destination, &ExtractOptions::default())
    }

    /// Like [`Archive::extract`], with options.
    pub fn extract_with(
        &self,
        destination: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<()> {
        let destination = destination.as_ref();
        for header in &self.headers {
            self.extract_file(header, destination, options)?;
        }
        Ok(())
    }

    /// Write one member to `<destination>/<name>` and return the path.
    pub fn extract_file(
        &self,
        header: &Header,
        destination: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        header.to_entry().validate_path()?;
        let path = destination.join(header.name());

        let mut file = File::create(&path)?;
        let written = self.copy_entry(header, &mut file, options.buffer_size)?;
        file.flush()?;
        drop(file);

        if options.preserve_mtime {
            let mtime = UNIX_EPOCH + Duration::from_secs(header.mtime());
            filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(mtime))?;
        }
        debug!(name = header.name(), bytes = written, "extracted member");
        Ok(path)
    }

    fn copy_entry<W: Write>(&self, header: &Header, writer: &mut W, buffer_size: usize) -> Result<u64> {
        let mut stream = self.open_entry(header)?;
        let mut buffer = vec![0u8; buffer_size.max(1)];
        let mut written = 0u64;

        loop {
            let n = stream
                .read(&mut buffer)
                .map_err(|e| OxiArError::from_read(e, header.size() - written))?;
            if n == 0 {
                break;
            }
            writer.write_all(&buffer[..n])?;
            written += n as u64;
        }

        Ok(written)
    }
}

impl<R: Read + Seek> ArchiveReader for Archive<R> {
    fn entries(&mut self) -> Result<Vec<Entry>> {
        Ok(self.headers.iter().map(Header::to_entry).collect())
    }

    fn extract<W: Write>(&mut self, entry: &Entry, writer: &mut W) -> Result<u64> {
        let header = self
            .headers
            .iter()
            .find(|h| h.offset() == entry.offset)
            .ok_or_else(|| OxiArError::entry_not_found(&entry.name))?;
        self.extract_entry(header, writer)
    }
}

impl<R: Read + Seek> Drop for Archive<R> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                staged = self.pending.len(),
                "archive dropped with staged entries that were never committed"
            );
        }
    }
}

impl<R: Read + Seek> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("headers", &self.headers)
            .field("pending", &self.pending.len())
            .finish()
    }
}

