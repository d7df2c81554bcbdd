//! Error types for OxiAr operations.
//!
//! Every failure in the library surfaces as an [`OxiArError`]. Format
//! errors are fatal at the point of detection: once an entry boundary or a
//! numeric field cannot be trusted, the rest of the archive cannot be
//! trusted either, so there is no partial recovery.

use std::io;
use thiserror::Error;

/// The main error type for OxiAr operations.
#[derive(Debug, Error)]
pub enum OxiArError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with the archive magic string.
    #[error("Bad archive magic: expected {expected:02x?}, found {found:02x?}")]
    BadArchiveMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual bytes found.
        found: Vec<u8>,
    },

    /// A fixed-width read returned fewer bytes than required.
    #[error("Truncated input: expected {expected} more bytes")]
    TruncatedInput {
        /// Number of bytes that were expected but not available.
        expected: u64,
    },

    /// A numeric header field is neither blank nor a valid integer.
    #[error("Malformed integer {text:?} (radix {radix})")]
    MalformedInteger {
        /// Raw field text.
        text: String,
        /// Radix the field was decoded with.
        radix: u32,
    },

    /// The two terminator bytes closing an entry header are wrong.
    #[error("Bad header magic at offset {position}: found {found:02x?}")]
    BadHeaderMagic {
        /// Absolute position of the header.
        position: u64,
        /// Bytes found in place of the terminator.
        found: Vec<u8>,
    },

    /// An extended name reference points past the filename table.
    #[error("Extended name offset {offset} out of bounds (table size {table_size})")]
    OutOfBoundExtendedName {
        /// Referenced offset.
        offset: u64,
        /// Size of the filename table (0 if the archive has none).
        table_size: u64,
    },

    /// A value does not fit its fixed-width header field.
    #[error("Value {value} does not fit in a {width}-byte field (radix {radix})")]
    FieldOverflow {
        /// The value being serialized.
        value: u64,
        /// Width of the field in bytes.
        width: usize,
        /// Radix of the field.
        radix: u32,
    },

    /// Entry name would escape the extraction directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The offending name.
        path: String,
    },

    /// A member name cannot be stored so that it reads back unchanged.
    #[error("Member name cannot be stored in an archive: {name:?}")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },

    /// The backing stream is held by an open content stream.
    #[error("Backing stream is busy: a content stream is still open on it")]
    StreamBusy,

    /// The archive has no file to rewrite on commit.
    #[error("Archive was opened over a borrowed stream and has no path to commit to")]
    Detached,
}

/// Result type alias for OxiAr operations.
pub type Result<T> = std::result::Result<T, OxiArError>;

impl OxiArError {
    /// Create a bad archive magic error.
    pub fn bad_archive_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::BadArchiveMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(expected: u64) -> Self {
        Self::TruncatedInput { expected }
    }

    /// Create a malformed integer error.
    pub fn malformed_integer(field: &[u8], radix: u32) -> Self {
        Self::MalformedInteger {
            text: String::from_utf8_lossy(field).into_owned(),
            radix,
        }
    }

    /// Create a bad header magic error.
    pub fn bad_header_magic(position: u64, found: impl Into<Vec<u8>>) -> Self {
        Self::BadHeaderMagic {
            position,
            found: found.into(),
        }
    }

    /// Create an out-of-bound extended name error.
    pub fn out_of_bound_name(offset: u64, table_size: u64) -> Self {
        Self::OutOfBoundExtendedName { offset, table_size }
    }

    /// Create a field overflow error.
    pub fn field_overflow(value: u64, width: usize, radix: u32) -> Self {
        Self::FieldOverflow {
            value,
            width,
            radix,
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an invalid member name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Convert an I/O error raised while `expected` bytes were outstanding.
    ///
    /// A short read becomes [`OxiArError::TruncatedInput`], anything else
    /// stays an [`OxiArError::Io`].
    pub fn from_read(err: io::Error, expected: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::truncated(expected)
        } else {
            Self::Io(err)
        }
    }
}
