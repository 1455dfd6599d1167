// src/repository/mod.rs

//! Patch repositories
//!
//! A repository is a filesystem tree of canonical metadata files,
//! `<root>/<name>/<version>/<name>-<version>.metadata`, queried by name
//! prefix and served newest-first. The [`Repository`] trait is the seam
//! consumed by the installer and the transport layer; [`LocalRepository`]
//! is the filesystem-backed implementation.

mod local;

pub use local::{LocalRepository, VersionComparator};

use std::io::{Read, Seek};

use crate::error::Result;
use crate::patch::{PackageMetadata, Patch, PatchId};

/// A readable, seekable archive stream
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// The repository contract exposed to collaborators
pub trait Repository {
    /// All available patch ids, newest first; optionally restricted to
    /// names starting with `prefix`
    fn query_available(&self, prefix: Option<&str>) -> Result<Vec<PatchId>>;

    /// The newest id whose name starts with `prefix`, if any
    fn get_latest_available(&self, prefix: &str) -> Result<Option<PatchId>>;

    /// The stored patch for `id`, or `None` if absent
    fn get_patch(&self, id: &PatchId) -> Result<Option<Patch>>;

    /// Ingest a patch archive and store it under the metadata's id
    ///
    /// Fails with [`Error::DuplicatePatch`](crate::Error::DuplicatePatch)
    /// when the id already exists and `force` is false; with `force` the
    /// stored patch is replaced.
    fn add_archive(
        &self,
        metadata: &PackageMetadata,
        archive: &mut dyn ReadSeek,
        force: bool,
    ) -> Result<PatchId>;

    /// Remove the patch and its version directory; returns whether
    /// anything was removed
    fn remove_archive(&self, id: &PatchId) -> Result<bool>;
}
