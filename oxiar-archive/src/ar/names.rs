//! The `//` extended filename table.
//!
//! Names that do not fit the 16-byte header field are stored in a special
//! member as newline-terminated strings. Regular headers then carry
//! `/<offset>` in their name field, where `offset` is a byte offset into the
//! table payload.

use super::header::Header;
use super::{NAME_LEN, PAD_BYTE};
use oxiar_core::error::{OxiArError, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// Location of the filename table payload in the backing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameTable {
    offset: u64,
    size: u64,
}

impl NameTable {
    pub(crate) fn from_header(header: &Header) -> Self {
        Self {
            offset: header.offset(),
            size: header.size(),
        }
    }

    /// Read the name stored at `index`, leaving the reader where it was.
    pub(crate) fn resolve<R: Read + Seek>(&self, reader: &mut R, index: u64) -> Result<String> {
        if index >= self.size {
            return Err(OxiArError::out_of_bound_name(index, self.size));
        }

        let mut guard = SeekGuard::new(reader)?;
        guard.inner().seek(SeekFrom::Start(self.offset + index))?;

        let mut name = Vec::new();
        for byte in guard.inner().take(self.size - index).bytes() {
            let byte = byte?;
            if byte == b'\n' {
                break;
            }
            name.push(byte);
        }
        guard.restore()?;

        Ok(String::from_utf8_lossy(&name).into_owned())
    }
}

/// Restores a stream position when dropped.
///
/// [`SeekGuard::restore`] does the same but reports the seek error.
pub(crate) struct SeekGuard<'a, S: Seek> {
    inner: &'a mut S,
    saved: u64,
    armed: bool,
}

impl<'a, S: Seek> SeekGuard<'a, S> {
    pub(crate) fn new(inner: &'a mut S) -> io::Result<Self> {
        let saved = inner.stream_position()?;
        Ok(Self {
            inner,
            saved,
            armed: true,
        })
    }

    pub(crate) fn inner(&mut self) -> &mut S {
        &mut *self.inner
    }

    pub(crate) fn restore(mut self) -> io::Result<()> {
        self.armed = false;
        self.inner.seek(SeekFrom::Start(self.saved)).map(|_| ())
    }
}

impl<S: Seek> Drop for SeekGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.inner.seek(SeekFrom::Start(self.saved));
        }
    }
}

/// Accumulates the long names a rewrite has to append to the table.
#[derive(Debug, Default)]
pub(crate) struct NameTableBuilder {
    base: u64,
    appended: Vec<u8>,
}

impl NameTableBuilder {
    /// Start after an existing table of `existing_size` bytes.
    pub(crate) fn new(existing_size: u64) -> Self {
        Self {
            base: existing_size,
            appended: Vec::new(),
        }
    }

    /// Return the header name field for `name`.
    ///
    /// Short names are stored inline as `name/`; longer ones are appended
    /// to the table and replaced by a `/<offset>` reference. Names that are
    /// empty or start with `/` also go to the table, since inline they would
    /// read back as a special member or a table reference. A newline cannot
    /// be stored at all because it terminates table entries.
    pub(crate) fn name_field(&mut self, name: &str) -> Result<String> {
        if name.contains('\n') {
            return Err(OxiArError::invalid_name(name));
        }
        let serialized = format!("{name}/");
        if serialized.len() <= NAME_LEN && !serialized.starts_with('/') {
            return Ok(serialized);
        }
        let offset = self.size();
        self.appended.extend_from_slice(serialized.as_bytes());
        self.appended.push(b'\n');
        Ok(format!("/{offset}"))
    }

    /// Whether any long name was added.
    pub(crate) fn is_empty(&self) -> bool {
        self.appended.is_empty()
    }

    /// Final size of the table payload, without padding.
    pub(crate) fn size(&self) -> u64 {
        self.base + self.appended.len() as u64
    }

    /// Bytes to write after the existing table payload.
    pub(crate) fn appended(&self) -> &[u8] {
        &self.appended
    }

    /// Padding that keeps the next header on an even offset.
    pub(crate) fn padding(&self) -> &'static [u8] {
        if self.size() % 2 == 1 { &[PAD_BYTE] } else { &[] }
    }
}
