// src/repository/local.rs

//! Filesystem-backed patch repository
//!
//! Each patch lives at `<root>/<name>/<version>/<name>-<version>.metadata`.
//! Metadata writes go to a temp file in the target directory and are
//! renamed into place, so no reader ever observes a partial file. Every
//! operation runs under the injected advisory lock; contention surfaces
//! as `RepositoryBusy`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::archive::patch_from_zip;
use crate::codec::{self, MANAGED_PATHS, METADATA_SUFFIX};
use crate::error::{Error, Result};
use crate::lock::{self, RepositoryLock};
use crate::patch::{Action, PackageMetadata, Patch, PatchId, Record, Version};
use crate::repository::{ReadSeek, Repository};

/// Optional version ordering hook injected by the caller
pub type VersionComparator = Arc<dyn Fn(&Version, &Version) -> Ordering + Send + Sync>;

/// A patch repository rooted at a local directory
pub struct LocalRepository {
    root: PathBuf,
    lock: Arc<dyn RepositoryLock>,
    comparator: Option<VersionComparator>,
}

impl LocalRepository {
    /// Open (creating if necessary) a repository at `root`
    ///
    /// The lock serializes all operations on the index and is taken
    /// around every public method.
    pub fn new(root: impl Into<PathBuf>, lock: Arc<dyn RepositoryLock>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            lock,
            comparator: None,
        })
    }

    /// Install a custom version ordering used by queries
    pub fn with_version_comparator(mut self, comparator: VersionComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a patch to its canonical location, replacing any previous
    /// content
    pub fn write_patch(&self, patch: &Patch) -> Result<()> {
        let _guard = lock::acquire(self.lock.as_ref())?;
        self.write_patch_locked(patch)
    }

    /// Read the patch stored under `id`, or `None` if absent
    pub fn read_patch(&self, id: &PatchId) -> Result<Option<Patch>> {
        let _guard = lock::acquire(self.lock.as_ref())?;
        self.read_patch_locked(id)
    }

    /// Query stored ids, optionally by name prefix and latest-per-name,
    /// sorted descending
    pub fn query(&self, prefix: Option<&str>, latest_only: bool) -> Result<Vec<PatchId>> {
        let _guard = lock::acquire(self.lock.as_ref())?;
        self.query_locked(prefix, latest_only)
    }

    fn metadata_dir(&self, id: &PatchId) -> PathBuf {
        self.root
            .join(id.name())
            .join(id.version().to_string())
    }

    fn metadata_file(&self, id: &PatchId) -> PathBuf {
        self.metadata_dir(id)
            .join(format!("{}{}", id, METADATA_SUFFIX))
    }

    fn compare_ids(&self, a: &PatchId, b: &PatchId) -> Ordering {
        a.name().cmp(b.name()).then_with(|| match &self.comparator {
            Some(comparator) => comparator(a.version(), b.version()),
            None => a.version().cmp(b.version()),
        })
    }

    fn write_patch_locked(&self, patch: &Patch) -> Result<()> {
        let dir = self.metadata_dir(patch.patch_id());
        fs::create_dir_all(&dir)?;
        let target = self.metadata_file(patch.patch_id());

        // Write-then-rename; the temp file is removed on any failure
        let mut temp = NamedTempFile::new_in(&dir)?;
        codec::write_patch(patch, &mut temp)?;
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|err| Error::Io(err.error))?;

        debug!(id = %patch.patch_id(), path = %target.display(), "wrote patch metadata");
        Ok(())
    }

    fn read_patch_locked(&self, id: &PatchId) -> Result<Option<Patch>> {
        let path = self.metadata_file(id);
        if !path.is_file() {
            return Ok(None);
        }
        codec::read_patch_file(&path).map(Some)
    }

    fn query_locked(&self, prefix: Option<&str>, latest_only: bool) -> Result<Vec<PatchId>> {
        let mut groups: BTreeMap<String, Vec<PatchId>> = BTreeMap::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if file_name == MANAGED_PATHS || !file_name.ends_with(METADATA_SUFFIX) {
                continue;
            }
            let id = PatchId::from_file_name(&file_name).map_err(|_| {
                Error::RepositoryCorrupt(format!(
                    "unparseable metadata file name: {}",
                    entry.path().display()
                ))
            })?;
            self.verify_layout(entry.path(), &id)?;

            let group = groups.entry(id.name().to_string()).or_default();
            if group.contains(&id) {
                return Err(Error::RepositoryCorrupt(format!(
                    "colliding patch id {} at {}",
                    id,
                    entry.path().display()
                )));
            }
            group.push(id);
        }

        let mut result = Vec::new();
        for (name, mut ids) in groups {
            if let Some(prefix) = prefix {
                if !name.starts_with(prefix) {
                    continue;
                }
            }
            ids.sort_by(|a, b| self.compare_ids(a, b));
            if latest_only {
                if let Some(newest) = ids.pop() {
                    result.push(newest);
                }
            } else {
                result.append(&mut ids);
            }
        }
        result.sort_by(|a, b| self.compare_ids(b, a));
        Ok(result)
    }

    /// Verify that the enclosing `<name>/<version>` directories match
    /// the id derived from the file name
    fn verify_layout(&self, path: &Path, id: &PatchId) -> Result<()> {
        let version_dir = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned());
        let name_dir = path
            .parent()
            .and_then(Path::parent)
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned());
        if version_dir.as_deref() != Some(id.version().to_string().as_str())
            || name_dir.as_deref() != Some(id.name())
        {
            return Err(Error::RepositoryCorrupt(format!(
                "metadata file {} does not match its directory layout",
                path.display()
            )));
        }
        Ok(())
    }

    fn add_archive_locked(
        &self,
        metadata: &PackageMetadata,
        archive: &mut dyn ReadSeek,
        force: bool,
    ) -> Result<PatchId> {
        let id = metadata.patch_id().clone();
        if self.metadata_file(&id).is_file() && !force {
            return Err(Error::DuplicatePatch(id));
        }

        let ingested = patch_from_zip(&id, Action::Add, archive)?;
        let records: Vec<Record> = ingested.records().cloned().collect();
        let patch = Patch::new(metadata.to_patch_metadata()?, records)?;
        self.write_patch_locked(&patch)?;

        debug!(id = %id, records = patch.record_count(), force, "added patch archive");
        Ok(id)
    }

    fn remove_archive_locked(&self, id: &PatchId) -> Result<bool> {
        let dir = self.metadata_dir(id);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        debug!(id = %id, "removed patch archive");
        Ok(true)
    }
}

impl Repository for LocalRepository {
    fn query_available(&self, prefix: Option<&str>) -> Result<Vec<PatchId>> {
        self.query(prefix, false)
    }

    fn get_latest_available(&self, prefix: &str) -> Result<Option<PatchId>> {
        Ok(self.query(Some(prefix), true)?.into_iter().next())
    }

    fn get_patch(&self, id: &PatchId) -> Result<Option<Patch>> {
        self.read_patch(id)
    }

    fn add_archive(
        &self,
        metadata: &PackageMetadata,
        archive: &mut dyn ReadSeek,
        force: bool,
    ) -> Result<PatchId> {
        let _guard = lock::acquire(self.lock.as_ref())?;
        self.add_archive_locked(metadata, archive, force)
    }

    fn remove_archive(&self, id: &PatchId) -> Result<bool> {
        let _guard = lock::acquire(self.lock.as_ref())?;
        self.remove_archive_locked(id)
    }
}

fn walk_error(err: walkdir::Error) -> Error {
    match err.into_io_error() {
        Some(io) => Error::Io(io),
        None => Error::RepositoryCorrupt("filesystem loop in repository tree".to_string()),
    }
}
