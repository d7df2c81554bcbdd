//! # OxiAr Archive
//!
//! Unix `ar` container support for OxiAr.
//!
//! This crate reads, extracts and merges `ar` archives, the format behind
//! static libraries (`.a`, `.lib`) and Debian packages:
//!
//! - **Index**: one pass over the member headers on open
//! - **Extended names**: GNU `//` filename table, read and extended
//! - **Content streams**: bounded readers over a single member payload
//! - **Merge**: staged appends, committed through an atomic rewrite
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxiar_archive::ar::Archive;
//!
//! let mut target = Archive::open("libfoo.a").unwrap();
//! let source = Archive::open("libbar.a").unwrap();
//! target.merge(&source);
//! target.commit().unwrap();
//! println!("{:?}", target.list());
//! ```
//!
//! ## Format Detection
//!
//! Use [`detect::ArchiveFormat`] to check a file's magic before opening it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod ar;
pub mod detect;

// Re-exports
pub use ar::{Archive, ContentStream, ExtractOptions, Header, HeaderKind};
pub use detect::{ArchiveFormat, is_ar_archive};
