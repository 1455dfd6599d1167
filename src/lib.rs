// src/lib.rs

//! Fusepatch Patch Repository
//!
//! Library core for managing a repository of software patches:
//! versioned archives of files to be installed into a target product
//! tree. This crate owns the canonical on-disk metadata format, the
//! patch data model, zip archive ingestion, and the filesystem-backed
//! repository index.
//!
//! # Architecture
//!
//! - Value objects first: identifiers, records, and metadata are
//!   immutable, validated once at construction
//! - Text container format: one `.metadata` file per patch, parsed and
//!   written by a line-oriented codec
//! - Filesystem as index: patches live at
//!   `<root>/<name>/<version>/<name>-<version>.metadata`, queries walk
//!   the tree and order ids by name and componentwise version
//! - Explicit concurrency contract: an injected advisory lock
//!   serializes repository operations; writes are atomic via
//!   write-then-rename
//!
//! The installer, transport, and CLI layers build on the [`Repository`]
//! trait without further knowledge of the on-disk format.

pub mod archive;
pub mod codec;
mod error;
pub mod lock;
pub mod patch;
pub mod repository;

pub use archive::patch_from_zip;
pub use codec::{read_patch, read_patch_file, write_patch, MANAGED_PATHS, TOOL_VERSION};
pub use error::{Error, Result};
pub use lock::{FileLock, LockGuard, RepositoryLock};
pub use patch::{
    Action, PackageMetadata, PackageMetadataBuilder, Patch, PatchId, PatchMetadata,
    PatchMetadataBuilder, Record, Version,
};
pub use repository::{LocalRepository, ReadSeek, Repository, VersionComparator};
