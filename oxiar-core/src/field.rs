//! Fixed-width ASCII fields.
//!
//! Archive headers store every value as left-justified, space-padded ASCII
//! text in a field of fixed width. [`FieldRead`] decodes such fields from any
//! reader; [`write_uint`] and [`write_text`] encode them into a header buffer.

use crate::error::{OxiArError, Result};
use std::io::Read;

/// Decoding of fixed-width fields, available on every [`Read`].
pub trait FieldRead: Read {
    /// Read exactly `len` bytes.
    ///
    /// Fails with [`OxiArError::TruncatedInput`] if the stream ends first.
    fn read_field(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)
            .map_err(|e| OxiArError::from_read(e, len as u64))?;
        Ok(buf)
    }

    /// Read `len` bytes and decode them as an unsigned integer in `radix`.
    ///
    /// A blank field decodes to zero.
    fn read_uint(&mut self, len: usize, radix: u32) -> Result<u64> {
        let field = self.read_field(len)?;
        parse_uint(&field, radix)
    }
}

impl<R: Read + ?Sized> FieldRead for R {}

/// Decode an unsigned integer from a space-padded ASCII field.
pub fn parse_uint(field: &[u8], radix: u32) -> Result<u64> {
    let text = trim_spaces(field);
    if text.is_empty() {
        return Ok(0);
    }
    // from_str_radix accepts a leading '+', the format does not
    if !text.iter().all(|b| (*b as char).is_digit(radix)) {
        return Err(OxiArError::malformed_integer(field, radix));
    }
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| u64::from_str_radix(s, radix).ok())
        .ok_or_else(|| OxiArError::malformed_integer(field, radix))
}

/// Decode a text field: lossy UTF-8 with trailing spaces removed.
pub fn parse_text(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |p| p + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Encode `value` in `radix` (8 or 10) into `field`, left-justified and space-padded.
pub fn write_uint(field: &mut [u8], value: u64, radix: u32) -> Result<()> {
    let text = if radix == 8 {
        format!("{:o}", value)
    } else {
        value.to_string()
    };
    if text.len() > field.len() {
        return Err(OxiArError::field_overflow(value, field.len(), radix));
    }
    write_text(field, text.as_bytes());
    Ok(())
}

/// Copy `text` into `field`, left-justified and space-padded.
///
/// Text longer than the field is cut at the field width.
pub fn write_text(field: &mut [u8], text: &[u8]) {
    let len = text.len().min(field.len());
    field[..len].copy_from_slice(&text[..len]);
    field[len..].fill(b' ');
}

fn trim_spaces(field: &[u8]) -> &[u8] {
    let start = field.iter().position(|&b| b != b' ').unwrap_or(field.len());
    let end = field
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(start, |p| p + 1);
    &field[start..end]
}
