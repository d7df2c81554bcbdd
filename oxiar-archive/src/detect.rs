//! Archive format auto-detection.
//!
//! This module tells `ar` archives apart from other files by their 8-byte
//! global magic.

use crate::ar::MAGIC;
use oxiar_core::error::Result;
use std::io::{Read, Seek, SeekFrom};

/// Magic of GNU thin archives, whose members live outside the archive.
pub const THIN_MAGIC: &[u8; 8] = b"!<thin>\n";

/// Magic of AIX big archives.
pub const AIX_BIG_MAGIC: &[u8; 8] = b"<bigaf>\n";

/// Known archive flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Common `ar` archive (.a, .lib, .deb).
    Ar,
    /// GNU thin archive.
    Thin,
    /// AIX big archive.
    AixBig,
    /// Unknown format.
    Unknown,
}

impl ArchiveFormat {
    /// Detect format from magic bytes.
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(MAGIC) {
            Self::Ar
        } else if magic.starts_with(THIN_MAGIC) {
            Self::Thin
        } else if magic.starts_with(AIX_BIG_MAGIC) {
            Self::AixBig
        } else {
            Self::Unknown
        }
    }

    /// Detect format from a reader.
    ///
    /// Returns the format and the bytes consumed.
    pub fn detect<R: Read>(reader: &mut R) -> Result<(Self, Vec<u8>)> {
        let mut magic = Vec::with_capacity(MAGIC.len());
        reader.take(MAGIC.len() as u64).read_to_end(&mut magic)?;
        Ok((Self::from_magic(&magic), magic))
    }

    /// Get the typical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ar | Self::Thin | Self::AixBig => "a",
            Self::Unknown => "",
        }
    }

    /// Get the MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Ar | Self::Thin | Self::AixBig => "application/x-archive",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Whether [`crate::ar::Archive`] can read this format.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Ar)
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ar => write!(f, "ar"),
            Self::Thin => write!(f, "ar (thin)"),
            Self::AixBig => write!(f, "ar (AIX big)"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Check whether `reader` holds a supported `ar` archive.
///
/// The reader is rewound to where it was.
pub fn is_ar_archive<R: Read + Seek>(reader: &mut R) -> Result<bool> {
    let start = reader.stream_position()?;
    let (format, _) = ArchiveFormat::detect(reader)?;
    reader.seek(SeekFrom::Start(start))?;
    Ok(format.is_supported())
}
