// src/patch/mod.rs

//! The patch data model
//!
//! A [`Patch`] is an immutable pairing of validated [`PatchMetadata`]
//! with a set of content [`Record`]s ordered by path. Identifiers,
//! records, and metadata are value objects; the aggregate is a forest
//! with no back-pointers.

mod id;
mod metadata;
mod record;

pub use id::{PatchId, Version};
pub use metadata::{
    PackageMetadata, PackageMetadataBuilder, PatchMetadata, PatchMetadataBuilder,
};
pub use record::{Action, Record};

pub(crate) use record::validate_path;

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A patch: metadata plus path-ordered content records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    metadata: PatchMetadata,
    records: BTreeMap<String, Record>,
}

impl Patch {
    /// Assemble a patch, rejecting records with duplicate paths
    pub fn new(metadata: PatchMetadata, records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let mut ordered = BTreeMap::new();
        for record in records {
            let path = record.path().to_string();
            if ordered.insert(path.clone(), record).is_some() {
                return Err(Error::MalformedRecord(format!(
                    "duplicate record path: {}",
                    path
                )));
            }
        }
        Ok(Self {
            metadata,
            records: ordered,
        })
    }

    pub fn metadata(&self) -> &PatchMetadata {
        &self.metadata
    }

    pub fn patch_id(&self) -> &PatchId {
        self.metadata.patch_id()
    }

    /// Records in path-ascending order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Look up the record for a path
    pub fn record(&self, path: &str) -> Option<&Record> {
        self.records.get(path)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
