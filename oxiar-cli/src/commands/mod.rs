//! Command implementations for OxiAr CLI.

pub mod extract;
pub mod list;
pub mod merge;

pub use extract::{ExtractArgs, cmd_extract};
pub use list::{ListOptions, cmd_list};
pub use merge::cmd_merge;
