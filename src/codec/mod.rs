// src/codec/mod.rs

//! The on-disk metadata container format
//!
//! A metadata file is a line-oriented UTF-8 text container. The first
//! two non-empty lines form a mandatory header:
//!
//! ```text
//! # fusepatch: 0.1.0
//! # patch id: foo-1.0
//! ```
//!
//! followed by `[section]`-delimited bodies. `[properties]` holds
//! `Key: v1, v2` lines (One-off, Roles, Dependencies), `[content]` one
//! record per line in `path|ACTION|crc` form, and
//! `[post-install-commands]` one literal command per line. Blank lines
//! and `#` comments are permitted anywhere after the header; unknown
//! sections and property keys are ignored for forward compatibility.
//!
//! The writer emits sections in a fixed order, omits empty ones, and
//! guarantees that parsing its output yields a patch equal to the
//! input.

mod parser;
mod writer;

pub use parser::{read_patch, read_patch_file};
pub use writer::write_patch;

/// Reserved root-level metadata file maintained by the installer;
/// invisible to repository queries
pub const MANAGED_PATHS: &str = "managed-paths.metadata";

/// File extension of canonical metadata files
pub const METADATA_SUFFIX: &str = ".metadata";

/// Tool version recorded in the metadata header
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) const VERSION_PREFIX: &str = "# fusepatch:";
pub(crate) const PATCHID_PREFIX: &str = "# patch id:";

pub(crate) const SECTION_PROPERTIES: &str = "[properties]";
pub(crate) const SECTION_CONTENT: &str = "[content]";
pub(crate) const SECTION_POST_COMMANDS: &str = "[post-install-commands]";

pub(crate) const KEY_ONEOFF: &str = "One-off";
pub(crate) const KEY_ROLES: &str = "Roles";
pub(crate) const KEY_DEPENDENCIES: &str = "Dependencies";
