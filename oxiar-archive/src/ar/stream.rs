//! Bounded reads over one member's payload.

use super::header::Header;
use oxiar_core::error::Result;
use std::cell::RefMut;
use std::io::{self, Read, Seek, SeekFrom};

/// A reader over the payload of a single member.
///
/// The stream holds the archive's backing reader exclusively for its whole
/// lifetime and never reads past the member's declared size, however large
/// the caller's buffer is. Once the payload is exhausted every read returns
/// `Ok(0)`.
pub struct ContentStream<'a, R: Read + Seek> {
    inner: RefMut<'a, R>,
    size: u64,
    remaining: u64,
}

impl<'a, R: Read + Seek> ContentStream<'a, R> {
    pub(crate) fn new(mut inner: RefMut<'a, R>, header: &Header) -> Result<Self> {
        inner.seek(SeekFrom::Start(header.offset()))?;
        Ok(Self {
            inner,
            size: header.size(),
            remaining: header.size(),
        })
    }

    /// Declared payload size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes left before the end of the payload.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<R: Read + Seek> Read for ContentStream<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("payload ends {} bytes early", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> std::fmt::Debug for ContentStream<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("size", &self.size)
            .field("remaining", &self.remaining)
            .finish()
    }
}
