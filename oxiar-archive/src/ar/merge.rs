//! Staging entries into an archive and rewriting it.
//!
//! Nothing is written while entries are staged. On commit the whole archive
//! is rebuilt into a temporary file next to the original:
//!
//! 1. the magic,
//! 2. the filename table, extended with the long names of staged entries,
//! 3. every existing member, copied byte for byte,
//! 4. every staged member with a freshly serialized header,
//!
//! and the temporary file then replaces the original in one rename.

use super::header::{self, Header};
use super::names::NameTableBuilder;
use super::stream::ContentStream;
use super::{Archive, DEFAULT_MODE, HEADER_LEN, MAGIC, PAD_BYTE};
use oxiar_core::error::{OxiArError, Result};
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Where the payload of a staged entry comes from.
pub(crate) trait EntrySource {
    /// Copy exactly `header.size()` payload bytes to `out`.
    fn copy_to(&self, header: &Header, out: &mut dyn Write) -> Result<()>;
}

/// The backing stream of another archive.
impl<R: Read + Seek> EntrySource for RefCell<R> {
    fn copy_to(&self, header: &Header, out: &mut dyn Write) -> Result<()> {
        let reader = self.try_borrow_mut().map_err(|_| OxiArError::StreamBusy)?;
        let mut stream = ContentStream::new(reader, header)?;
        let copied =
            io::copy(&mut stream, out).map_err(|e| OxiArError::from_read(e, header.size()))?;
        debug_assert_eq!(copied, header.size());
        Ok(())
    }
}

/// A payload held in memory.
impl EntrySource for Vec<u8> {
    fn copy_to(&self, _header: &Header, out: &mut dyn Write) -> Result<()> {
        out.write_all(self)?;
        Ok(())
    }
}

/// An entry waiting for the next commit.
pub(crate) struct Pending {
    header: Header,
    source: Rc<dyn EntrySource>,
}

impl<R: Read + Seek> Archive<R> {
    /// Stage every visible member of `source` for appending.
    ///
    /// No bytes move until commit. The source's backing stream is shared
    /// with this archive, so it stays readable even if `source` itself is
    /// dropped first.
    ///
    /// Because of that sharing, `S` must own its data: an archive over a
    /// lent stream such as `Archive<&mut Cursor<_>>` cannot be a merge
    /// source. Copy its members with [`Archive::extract_to_vec`] and
    /// [`Archive::stage_bytes`] instead.
    pub fn merge<S: Read + Seek + 'static>(&mut self, source: &Archive<S>) {
        let shared: Rc<dyn EntrySource> = source.stream.clone();
        self.pending
            .extend(source.headers.iter().map(|header| Pending {
                header: header.clone(),
                source: Rc::clone(&shared),
            }));
        debug!(
            staged = source.headers.len(),
            pending = self.pending.len(),
            "staged members from merge source"
        );
    }

    /// Stage a new member holding `data`.
    ///
    /// A name containing a newline cannot be stored; the next commit fails
    /// with [`OxiArError::InvalidName`] before anything is written.
    pub fn stage_bytes(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let header = Header::staged(name, data.len() as u64, DEFAULT_MODE);
        self.pending.push(Pending {
            header,
            source: Rc::new(data),
        });
    }

    /// Headers of the staged members, in staging order.
    pub fn pending(&self) -> impl Iterator<Item = &Header> {
        self.pending.iter().map(|p| &p.header)
    }

    /// Whether a commit would rewrite the archive.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Serialize the archive, staged members included, to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut table =
            NameTableBuilder::new(self.name_table.as_ref().map_or(0, Header::size));
        let name_fields = self
            .pending
            .iter()
            .map(|p| table.name_field(p.header.name()))
            .collect::<Result<Vec<_>>>()?;

        out.write_all(MAGIC)?;

        {
            let mut reader = self
                .stream
                .try_borrow_mut()
                .map_err(|_| OxiArError::StreamBusy)?;

            match &self.name_table {
                None if table.is_empty() => {}
                None => {
                    out.write_all(&header::encode_name_table(table.size())?)?;
                    out.write_all(table.appended())?;
                    out.write_all(table.padding())?;
                }
                Some(existing) => {
                    let mut block = [0u8; HEADER_LEN];
                    reader.seek(SeekFrom::Start(existing.position()))?;
                    reader
                        .read_exact(&mut block)
                        .map_err(|e| OxiArError::from_read(e, HEADER_LEN as u64))?;
                    header::rewrite_size(&mut block, table.size())?;
                    out.write_all(&block)?;

                    reader.seek(SeekFrom::Start(existing.offset()))?;
                    copy_exact(&mut *reader, out, existing.size())?;
                    out.write_all(table.appended())?;
                    out.write_all(table.padding())?;
                }
            }

            if self.symbol_index.is_some() {
                warn!("dropping symbol index, its offsets would be stale after the rewrite");
            }

            for header in &self.headers {
                self.copy_member(&mut *reader, out, header)?;
            }
        }

        for (pending, name_field) in self.pending.iter().zip(&name_fields) {
            out.write_all(&pending.header.encode(name_field)?)?;
            pending.source.copy_to(&pending.header, out)?;
            if pending.header.size() % 2 == 1 {
                out.write_all(&[PAD_BYTE])?;
            }
        }

        out.flush()?;
        Ok(())
    }

    /// Copy header, payload and pad of an existing member verbatim.
    ///
    /// A pad byte missing at the very end of the file is supplied.
    fn copy_member<W: Write>(&self, reader: &mut R, out: &mut W, header: &Header) -> Result<()> {
        let end = header.next_position().min(self.len);
        reader.seek(SeekFrom::Start(header.position()))?;
        copy_exact(reader, out, end - header.position())?;
        if end < header.next_position() {
            out.write_all(&[PAD_BYTE])?;
        }
        Ok(())
    }
}

impl Archive<BufReader<File>> {
    /// Write staged members into the backing file.
    ///
    /// The new archive is built in a temporary file in the same directory
    /// and renamed over the original only once complete, so a failure
    /// leaves the original untouched. Afterwards the archive is re-indexed
    /// from the new file. Without staged members this is a no-op.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let path = self.path.clone().ok_or(OxiArError::Detached)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(temp.as_file_mut());
            self.write_to(&mut out)?;
            out.into_inner().map_err(io::IntoInnerError::into_error)?;
        }
        temp.as_file().sync_all()?;
        // the original is only replaced by something that indexes cleanly
        Archive::new(BufReader::new(temp.reopen()?))?;
        fs::set_permissions(temp.path(), fs::metadata(&path)?.permissions())?;
        temp.persist(&path).map_err(|e| OxiArError::Io(e.error))?;

        let appended = self.pending.len();
        self.pending.clear();
        info!(path = %path.display(), appended, "committed archive");

        *self = Self::open(&path)?;
        Ok(())
    }
}

/// Copy exactly `len` bytes from `reader` to `out`.
fn copy_exact<R: Read + ?Sized, W: Write + ?Sized>(reader: &mut R, out: &mut W, len: u64) -> Result<()> {
    let copied = io::copy(&mut reader.take(len), out)?;
    if copied < len {
        return Err(OxiArError::truncated(len - copied));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn member(name_field: &str, payload: &[u8]) -> Vec<u8> {
        let mut data = format!(
            "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
            name_field,
            1_700_000_000,
            0,
            0,
            644,
            payload.len()
        )
        .into_bytes();
        data.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            data.push(b'\n');
        }
        data
    }

    fn simple() -> Vec<u8> {
        let mut data = MAGIC.to_vec();
        data.extend(member("foo/", b"content foo\n"));
        data.extend(member("bar/", b"content bar\n"));
        data
    }

    fn long() -> Vec<u8> {
        let table = b"veryverylongfilename/\nevenveryverylongerfilename/\n";
        let mut data = MAGIC.to_vec();
        data.extend(member("//", table));
        data.extend(member("/0", b"veryverylong\n"));
        data.extend(member("shortfilename/", b"short\n"));
        data.extend(member("/22", b"evenveryverylonger\n"));
        data
    }

    fn rewrite(target: Vec<u8>, source: Vec<u8>) -> Archive<Cursor<Vec<u8>>> {
        let mut target = Archive::new(Cursor::new(target)).unwrap();
        let source = Archive::new(Cursor::new(source)).unwrap();
        target.merge(&source);

        let mut out = Vec::new();
        target.write_to(&mut out).unwrap();
        target.pending.clear();
        Archive::new(Cursor::new(out)).unwrap()
    }

    #[test]
    fn test_merge_is_lazy() {
        let mut target = Archive::new(Cursor::new(simple())).unwrap();
        let source = Archive::new(Cursor::new(long())).unwrap();
        target.merge(&source);

        assert_eq!(target.list(), ["foo", "bar"]);
        let staged: Vec<_> = target.pending().map(Header::name).collect();
        assert_eq!(
            staged,
            ["veryverylongfilename", "shortfilename", "evenveryverylongerfilename"]
        );
        target.pending.clear();
    }

    #[test]
    fn test_simple_into_simple() {
        let mut source = MAGIC.to_vec();
        source.extend(member("quux/", b"content quux\n"));

        let merged = rewrite(simple(), source);
        assert_eq!(merged.list(), ["foo", "bar", "quux"]);
        assert!(merged.name_table().is_none());
        let quux = merged.header("quux").unwrap();
        assert_eq!(merged.extract_to_vec(quux).unwrap(), b"content quux\n");
        assert_eq!(quux.mtime(), 1_700_000_000);
        assert_eq!(quux.mode(), 0o644);
    }

    #[test]
    fn test_existing_members_copied_verbatim() {
        let mut source = MAGIC.to_vec();
        source.extend(member("quux/", b"content quux\n"));

        let original = simple();
        let mut target = Archive::new(Cursor::new(original.clone())).unwrap();
        let source = Archive::new(Cursor::new(source)).unwrap();
        target.merge(&source);
        let mut out = Vec::new();
        target.write_to(&mut out).unwrap();
        target.pending.clear();

        assert_eq!(&out[..original.len()], &original[..]);
    }

    #[test]
    fn test_long_names_create_table() {
        let mut source = MAGIC.to_vec();
        source.extend(member("//", b"veryverylongmergedfilename/\n"));
        source.extend(member("/0", b"veryverylongmerged\n"));

        let merged = rewrite(simple(), source);
        assert_eq!(merged.list(), ["foo", "bar", "veryverylongmergedfilename"]);

        let table = merged.name_table().unwrap();
        assert_eq!(table.position(), MAGIC.len() as u64);
        assert_eq!(table.size(), 28);
        let header = merged.header("veryverylongmergedfilename").unwrap();
        assert_eq!(
            merged.extract_to_vec(header).unwrap(),
            b"veryverylongmerged\n"
        );
    }

    #[test]
    fn test_long_names_extend_existing_table() {
        let mut source = MAGIC.to_vec();
        source.extend(member("//", b"veryverylongmergedfilename/\n"));
        source.extend(member("/0", b"veryverylongmerged\n"));

        let merged = rewrite(long(), source);
        assert_eq!(
            merged.list(),
            [
                "veryverylongfilename",
                "shortfilename",
                "evenveryverylongerfilename",
                "veryverylongmergedfilename"
            ]
        );
        assert_eq!(merged.name_table().unwrap().size(), 50 + 28);
        for (name, content) in [
            ("veryverylongfilename", &b"veryverylong\n"[..]),
            ("evenveryverylongerfilename", b"evenveryverylonger\n"),
            ("veryverylongmergedfilename", b"veryverylongmerged\n"),
        ] {
            let header = merged.header(name).unwrap();
            assert_eq!(merged.extract_to_vec(header).unwrap(), content);
        }
    }

    #[test]
    fn test_odd_table_is_padded() {
        let merged = {
            let mut target = Archive::new(Cursor::new(simple())).unwrap();
            target.stage_bytes("name_of_17_chars_", b"odd".to_vec());
            let mut out = Vec::new();
            target.write_to(&mut out).unwrap();
            target.pending.clear();
            out
        };
        // table payload is 19 bytes, so one pad byte follows it
        assert_eq!(merged[8 + HEADER_LEN + 19], PAD_BYTE);
        assert_eq!((8 + HEADER_LEN + 20) % 2, 0);

        let archive = Archive::new(Cursor::new(merged)).unwrap();
        let header = archive.header("name_of_17_chars_").unwrap();
        assert_eq!(header.size(), 3);
        assert_eq!(archive.extract_to_vec(header).unwrap(), b"odd");
    }

    #[test]
    fn test_symbol_index_dropped() {
        let mut target = MAGIC.to_vec();
        target.extend(member("/", b"\0\0\0\0"));
        target.extend(simple()[MAGIC.len()..].to_vec());

        let merged = rewrite(target, simple());
        assert!(merged.symbol_index().is_none());
        assert_eq!(merged.list(), ["foo", "bar", "foo", "bar"]);
    }

    #[test]
    fn test_missing_final_pad_is_supplied() {
        let mut target = MAGIC.to_vec();
        target.extend(member("odd/", b"abc"));
        target.pop();

        let mut source = MAGIC.to_vec();
        source.extend(member("quux/", b"content quux\n"));

        let merged = rewrite(target, source);
        assert_eq!(merged.list(), ["odd", "quux"]);
        let quux = merged.header("quux").unwrap();
        assert_eq!(quux.position() % 2, 0);
        assert_eq!(merged.extract_to_vec(quux).unwrap(), b"content quux\n");
    }

    #[test]
    fn test_busy_source_fails() {
        let mut target = Archive::new(Cursor::new(simple())).unwrap();
        let source = Archive::new(Cursor::new(simple())).unwrap();
        target.merge(&source);

        let header = source.headers()[0].clone();
        let _open = source.open_entry(&header).unwrap();
        let err = target.write_to(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, OxiArError::StreamBusy));
        target.pending.clear();
    }

    #[test]
    fn test_source_outlives_drop() {
        let mut target = Archive::new(Cursor::new(simple())).unwrap();
        {
            let mut source = MAGIC.to_vec();
            source.extend(member("quux/", b"content quux\n"));
            let source = Archive::new(Cursor::new(source)).unwrap();
            target.merge(&source);
        }
        let mut out = Vec::new();
        target.write_to(&mut out).unwrap();
        target.pending.clear();

        let merged = Archive::new(Cursor::new(out)).unwrap();
        assert_eq!(merged.list(), ["foo", "bar", "quux"]);
    }

    #[test]
    fn test_blank_name_survives_rewrite() {
        let mut source = MAGIC.to_vec();
        source.extend(member("", b"ab"));
        let source_archive = Archive::new(Cursor::new(source.clone())).unwrap();
        assert_eq!(source_archive.list(), [""]);

        let merged = rewrite(simple(), source);
        assert_eq!(merged.list(), ["foo", "bar", ""]);
        assert!(merged.symbol_index().is_none());
        let blank = merged.header("").unwrap();
        assert_eq!(merged.extract_to_vec(blank).unwrap(), b"ab");

        // a second rewrite keeps it too
        let again = rewrite(simple(), {
            let mut out = Vec::new();
            merged.write_to(&mut out).unwrap();
            out
        });
        assert_eq!(again.list(), ["foo", "bar", "foo", "bar", ""]);
    }

    #[test]
    fn test_slash_names_use_table() {
        let names = ["/", "//", "/SYM64", "/1"];
        let mut target = Archive::new(Cursor::new(simple())).unwrap();
        for name in names {
            target.stage_bytes(name, name.as_bytes().to_vec());
        }
        let mut out = Vec::new();
        target.write_to(&mut out).unwrap();
        target.pending.clear();

        let merged = Archive::new(Cursor::new(out)).unwrap();
        assert_eq!(merged.list(), ["foo", "bar", "/", "//", "/SYM64", "/1"]);
        assert!(merged.symbol_index().is_none());
        assert_eq!(merged.name_table().unwrap().size(), 19);
        for name in names {
            let header = merged.header(name).unwrap();
            assert_eq!(merged.extract_to_vec(header).unwrap(), name.as_bytes());
        }
    }

    #[test]
    fn test_newline_name_writes_nothing() {
        for name in ["a\nb", "a_long_name_with\nnewline_inside"] {
            let mut target = Archive::new(Cursor::new(simple())).unwrap();
            target.stage_bytes("other", b"other\n".to_vec());
            target.stage_bytes(name, b"data".to_vec());

            let mut out = Vec::new();
            let err = target.write_to(&mut out).unwrap_err();
            assert!(matches!(err, OxiArError::InvalidName { name: ref n } if n == name));
            assert!(out.is_empty());
            target.pending.clear();
        }
    }

    #[test]
    fn test_lent_source_copied_by_staging() {
        let mut cursor = Cursor::new(long());
        let source = Archive::new(&mut cursor).unwrap();
        let mut target = Archive::new(Cursor::new(simple())).unwrap();
        for header in source.headers() {
            let data = source.extract_to_vec(header).unwrap();
            target.stage_bytes(header.name(), data);
        }
        drop(source);

        let mut out = Vec::new();
        target.write_to(&mut out).unwrap();
        target.pending.clear();
        let merged = Archive::new(Cursor::new(out)).unwrap();
        assert_eq!(
            merged.list(),
            [
                "foo",
                "bar",
                "veryverylongfilename",
                "shortfilename",
                "evenveryverylongerfilename"
            ]
        );
        let header = merged.header("evenveryverylongerfilename").unwrap();
        assert_eq!(merged.extract_to_vec(header).unwrap(), b"evenveryverylonger\n");
    }
}
