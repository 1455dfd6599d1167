// src/error.rs

//! Error taxonomy for the patch metadata subsystem.
//!
//! Every failure surfaces to the caller; the library never retries,
//! never swallows, and never logs in place of an error.

use thiserror::Error;

use crate::patch::PatchId;

/// Errors raised by the patch metadata subsystem
#[derive(Debug, Error)]
pub enum Error {
    /// A patch identifier string could not be parsed
    #[error("malformed patch id: {0}")]
    MalformedId(String),

    /// A content record line could not be parsed, or a record set
    /// violated an invariant
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A `[properties]` line could not be parsed
    #[error("malformed property: {0}")]
    MalformedProperty(String),

    /// The two-line metadata header is absent or malformed
    #[error("missing metadata header: {0}")]
    HeaderMissing(String),

    /// A patch archive contains an entry the repository cannot store
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// A structural invariant of the on-disk repository tree is violated
    #[error("repository corrupt: {0}")]
    RepositoryCorrupt(String),

    /// Metadata failed builder validation
    #[error("invalid patch metadata: {0}")]
    InvalidMetadata(String),

    /// Addition refused because the patch already exists and `force` was false
    #[error("patch already exists: {0}")]
    DuplicatePatch(PatchId),

    /// The advisory repository lock could not be acquired
    #[error("repository busy: {0}")]
    RepositoryBusy(String),

    /// An underlying filesystem or stream error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for patch repository operations
pub type Result<T> = std::result::Result<T, Error>;
