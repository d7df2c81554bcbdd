//! Archive member headers.
//!
//! Every member starts with a 60-byte block of fixed-width ASCII fields:
//!
//! ```text
//! offset  size  field
//!      0    16  name (space padded, `/` terminated for GNU)
//!     16    12  mtime (decimal)
//!     28     6  owner id (decimal)
//!     34     6  group id (decimal)
//!     40     8  mode (octal)
//!     48    10  size (decimal)
//!     58     2  terminator "`\n"
//! ```

use super::names::NameTable;
use super::{
    GID_LEN, HEADER_LEN, MODE_LEN, MTIME_LEN, NAME_LEN, NAME_TABLE, SIZE_LEN, SYMBOL_INDEX,
    SYMBOL_INDEX_64, TERMINATOR, UID_LEN,
};
use oxiar_core::error::{OxiArError, Result};
use oxiar_core::field::{self, FieldRead};
use oxiar_core::{Entry, FileAttributes};
use std::io::{Read, Seek};
use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

const MTIME_FIELD: Range<usize> = NAME_LEN..NAME_LEN + MTIME_LEN;
const UID_FIELD: Range<usize> = MTIME_FIELD.end..MTIME_FIELD.end + UID_LEN;
const GID_FIELD: Range<usize> = UID_FIELD.end..UID_FIELD.end + GID_LEN;
const MODE_FIELD: Range<usize> = GID_FIELD.end..GID_FIELD.end + MODE_LEN;
const SIZE_FIELD: Range<usize> = MODE_FIELD.end..MODE_FIELD.end + SIZE_LEN;

/// What a header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// The `/` (or `/SYM64/`) symbol index.
    SymbolIndex,
    /// The `//` extended filename table.
    NameTable,
    /// A regular member.
    Member,
}

/// Metadata of one archive member.
///
/// Headers are immutable once decoded. `position` is where the 60-byte
/// header starts, `offset` is where the payload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    size: u64,
    mtime: u64,
    uid: u32,
    gid: u32,
    mode: u32,
    position: u64,
    offset: u64,
}

impl Header {
    /// Decode the header at the current position of `reader`.
    ///
    /// Extended names (`/<offset>`) are resolved through `names`; the
    /// reader is left positioned at the start of the payload.
    pub(crate) fn read<R: Read + Seek>(reader: &mut R, names: Option<&NameTable>) -> Result<Self> {
        let position = reader.stream_position()?;

        let raw_name = field::parse_text(&reader.read_field(NAME_LEN)?);
        let name = if is_special(&raw_name) {
            raw_name
        } else if let Some(index) = raw_name.strip_prefix('/') {
            let index = field::parse_uint(index.as_bytes(), 10)?;
            let table = names.ok_or_else(|| OxiArError::out_of_bound_name(index, 0))?;
            strip_terminator(table.resolve(reader, index)?)
        } else {
            strip_terminator(raw_name)
        };

        let mtime = reader.read_uint(MTIME_LEN, 10)?;
        // six decimal / eight octal digits always fit in 32 bits
        let uid = reader.read_uint(UID_LEN, 10)? as u32;
        let gid = reader.read_uint(GID_LEN, 10)? as u32;
        let mode = reader.read_uint(MODE_LEN, 8)? as u32;
        let size = reader.read_uint(SIZE_LEN, 10)?;

        let terminator = reader.read_field(TERMINATOR.len())?;
        if terminator != TERMINATOR {
            return Err(OxiArError::bad_header_magic(position, terminator));
        }

        Ok(Self {
            name,
            size,
            mtime,
            uid,
            gid,
            mode,
            position,
            offset: reader.stream_position()?,
        })
    }

    /// Create a header for a payload that is not on disk yet.
    pub(crate) fn staged(name: impl Into<String>, size: u64, mode: u32) -> Self {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            name: name.into(),
            size,
            mtime,
            uid: 0,
            gid: 0,
            mode,
            position: 0,
            offset: 0,
        }
    }

    /// Member name, with any extended-name reference resolved.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Payload size rounded up to an even number of bytes.
    pub fn space(&self) -> u64 {
        self.size + self.size % 2
    }

    /// Modification time in Unix seconds.
    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    /// Owner ID.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Group ID.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Unix mode bits.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Absolute position of the header itself.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Absolute position of the payload.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Absolute position of the header that follows this member.
    pub fn next_position(&self) -> u64 {
        self.offset + self.space()
    }

    /// Classify the header by its name.
    pub fn kind(&self) -> HeaderKind {
        match self.name.as_str() {
            SYMBOL_INDEX | SYMBOL_INDEX_64 => HeaderKind::SymbolIndex,
            NAME_TABLE => HeaderKind::NameTable,
            _ => HeaderKind::Member,
        }
    }

    /// Convert to Entry.
    pub fn to_entry(&self) -> Entry {
        Entry::file(&self.name, self.size)
            .with_mtime(self.mtime)
            .with_attributes(
                FileAttributes::new()
                    .with_mode(self.mode)
                    .with_owner(self.uid, self.gid),
            )
            .with_offset(self.offset)
    }

    /// Serialize this header with `name_field` in place of the name.
    ///
    /// `name_field` is either the inline `name/` form or a `/<offset>`
    /// reference into the filename table.
    pub(crate) fn encode(&self, name_field: &str) -> Result<[u8; HEADER_LEN]> {
        let mut block = blank_block(name_field);
        field::write_uint(&mut block[MTIME_FIELD], self.mtime, 10)?;
        field::write_uint(&mut block[UID_FIELD], u64::from(self.uid), 10)?;
        field::write_uint(&mut block[GID_FIELD], u64::from(self.gid), 10)?;
        field::write_uint(&mut block[MODE_FIELD], u64::from(self.mode), 8)?;
        field::write_uint(&mut block[SIZE_FIELD], self.size, 10)?;
        Ok(block)
    }
}

/// Serialize a fresh `//` header: blank metadata and the given size.
pub(crate) fn encode_name_table(size: u64) -> Result<[u8; HEADER_LEN]> {
    let mut block = blank_block(NAME_TABLE);
    field::write_uint(&mut block[SIZE_FIELD], size, 10)?;
    Ok(block)
}

/// Overwrite only the size field of a raw header block.
pub(crate) fn rewrite_size(block: &mut [u8; HEADER_LEN], size: u64) -> Result<()> {
    field::write_uint(&mut block[SIZE_FIELD], size, 10)
}

fn blank_block(name_field: &str) -> [u8; HEADER_LEN] {
    let mut block = [b' '; HEADER_LEN];
    field::write_text(&mut block[..NAME_LEN], name_field.as_bytes());
    block[SIZE_FIELD.end..].copy_from_slice(TERMINATOR);
    block
}

fn is_special(name: &str) -> bool {
    matches!(name, SYMBOL_INDEX | SYMBOL_INDEX_64 | NAME_TABLE)
}

/// GNU marks the end of a name with a single `/`.
fn strip_terminator(mut name: String) -> String {
    if name.ends_with('/') {
        name.pop();
    }
    name
}
