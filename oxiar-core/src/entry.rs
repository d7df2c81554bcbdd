//! Archive entry metadata.
//!
//! This module defines the `Entry` struct that represents one member of an
//! archive, decoupled from the on-disk header it was decoded from.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Ownership and permission bits of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileAttributes {
    /// Unix mode bits, including the file type bits when present.
    pub mode: u32,
    /// Owner ID.
    pub uid: u32,
    /// Group ID.
    pub gid: u32,
}

impl FileAttributes {
    /// Create new empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Unix mode.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Set owner and group.
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Check if nobody may write the entry.
    pub fn is_readonly(&self) -> bool {
        self.mode & 0o222 == 0
    }

    /// Render the permission bits the way `ls -l` does (`rw-r--r--`).
    pub fn permissions(&self) -> String {
        const FLAGS: [(u32, char); 9] = [
            (0o400, 'r'),
            (0o200, 'w'),
            (0o100, 'x'),
            (0o040, 'r'),
            (0o020, 'w'),
            (0o010, 'x'),
            (0o004, 'r'),
            (0o002, 'w'),
            (0o001, 'x'),
        ];
        FLAGS
            .iter()
            .map(|&(bit, c)| if self.mode & bit != 0 { c } else { '-' })
            .collect()
    }
}

/// A member of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The resolved name of the entry.
    pub name: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// Mode, owner and group.
    pub attributes: FileAttributes,
    /// Absolute offset of the payload in the archive.
    pub offset: u64,
}

impl Entry {
    /// Create a new file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: None,
            attributes: FileAttributes::default(),
            offset: 0,
        }
    }

    /// Builder method to set modification time.
    pub fn with_modified(mut self, time: SystemTime) -> Self {
        self.modified = Some(time);
        self
    }

    /// Builder method to set the modification time from Unix seconds.
    pub fn with_mtime(self, secs: u64) -> Self {
        self.with_modified(UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// Builder method to set attributes.
    pub fn with_attributes(mut self, attrs: FileAttributes) -> Self {
        self.attributes = attrs;
        self
    }

    /// Builder method to set the payload offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Modification time as Unix seconds, if known.
    pub fn mtime(&self) -> Option<u64> {
        self.modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }

    /// Validate the entry name for extraction into a directory.
    ///
    /// Archive members are flat: a name must be a single, normal path
    /// component. Empty names, `.`/`..`, separators and NUL bytes are
    /// rejected.
    pub fn validate_path(&self) -> crate::error::Result<()> {
        use crate::error::OxiArError;

        let name = self.name.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(OxiArError::path_traversal(name));
        }
        Ok(())
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::file("", 0)
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:>5}/{:<5} {:>10} {}",
            self.attributes.permissions(),
            self.attributes.uid,
            self.attributes.gid,
            self.size,
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_file() {
        let entry = Entry::file("foo.o", 1000)
            .with_mtime(1_700_000_000)
            .with_offset(68);

        assert_eq!(entry.size, 1000);
        assert_eq!(entry.offset, 68);
        assert_eq!(entry.mtime(), Some(1_700_000_000));
    }

    #[test]
    fn test_validate_path_safe() {
        assert!(Entry::file("foo.o", 1).validate_path().is_ok());
        assert!(Entry::file("evenveryverylongerfilename", 1)
            .validate_path()
            .is_ok());
    }

    #[test]
    fn test_validate_path_traversal() {
        for name in ["", ".", "..", "../etc/passwd", "/etc/passwd", "a\\b", "nul\0"] {
            assert!(
                Entry::file(name, 1).validate_path().is_err(),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_file_attributes() {
        let attrs = FileAttributes::new().with_mode(0o100644).with_owner(1000, 100);
        assert_eq!(attrs.permissions(), "rw-r--r--");
        assert!(!attrs.is_readonly());
        assert!(FileAttributes::new().with_mode(0o444).is_readonly());
    }

    #[test]
    fn test_display() {
        let entry = Entry::file("foo", 12)
            .with_attributes(FileAttributes::new().with_mode(0o644).with_owner(0, 0));
        let line = entry.to_string();
        assert!(line.starts_with("rw-r--r--"));
        assert!(line.ends_with(" foo"));
    }
}
