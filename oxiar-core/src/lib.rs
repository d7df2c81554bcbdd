//! # OxiAr Core
//!
//! Core components for the OxiAr archive library.
//!
//! This crate provides the building blocks shared by the container code and
//! the command line front end:
//!
//! - [`field`]: Fixed-width ASCII field decoding and encoding
//! - [`entry`]: Archive entry metadata
//! - [`traits`]: Core traits for archive access
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Front end                                           │
//! │     oxiar CLI (list / extract / merge)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Container                                           │
//! │     ar headers, filename table, index, merge engine    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Fields (this crate)                                 │
//! │     fixed-width ASCII fields, Entry, errors            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiar_core::field::FieldRead;
//! use std::io::Cursor;
//!
//! let mut reader = Cursor::new(b"1700000000  100644  ".to_vec());
//! assert_eq!(reader.read_uint(12, 10).unwrap(), 1_700_000_000);
//! assert_eq!(reader.read_uint(8, 8).unwrap(), 0o100644);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod entry;
pub mod error;
pub mod field;
pub mod traits;

// Re-exports for convenience
pub use entry::{Entry, FileAttributes};
pub use error::{OxiArError, Result};
pub use field::FieldRead;
pub use traits::ArchiveReader;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::entry::{Entry, FileAttributes};
    pub use crate::error::{OxiArError, Result};
    pub use crate::field::FieldRead;
    pub use crate::traits::ArchiveReader;
}
