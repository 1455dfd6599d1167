// src/archive.rs

//! Patch archive ingestion
//!
//! Derives a [`Patch`] from a zip archive: every non-directory entry
//! becomes one content record. The CRC-32 is taken from the archive's
//! central directory and never recomputed; entry bodies are drained so
//! the whole stream is consumed exactly once.

use std::io::{self, Read, Seek};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::patch::{validate_path, Action, Patch, PatchId, PatchMetadataBuilder, Record};

/// Derive a patch from a zip stream
///
/// Directory entries and zero-length marker entries are skipped. Entry
/// names must be valid relative record paths; a violation fails the
/// whole ingestion with [`Error::MalformedArchive`]. The resulting
/// patch carries empty metadata apart from the id.
pub fn patch_from_zip<R: Read + Seek>(
    patch_id: &PatchId,
    action: Action,
    input: R,
) -> Result<Patch> {
    let mut archive = ZipArchive::new(input).map_err(zip_error)?;

    let mut records = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(zip_error)?;
        if entry.is_dir() || entry.size() == 0 {
            continue;
        }
        let name = entry.name().to_string();
        validate_path(&name)
            .map_err(|_| Error::MalformedArchive(format!("invalid entry path: {}", name)))?;
        let crc = if action == Action::Del { 0 } else { entry.crc32() };
        io::copy(&mut entry, &mut io::sink())?;
        records.push(Record::new(action, name, crc)?);
    }

    let metadata = PatchMetadataBuilder::new(patch_id.clone()).build()?;
    Patch::new(metadata, records)
}

fn zip_error(err: ZipError) -> Error {
    match err {
        ZipError::Io(err) => Error::Io(err),
        other => Error::MalformedArchive(other.to_string()),
    }
}
