// src/patch/record.rs

//! Content records
//!
//! A record describes one file-level change inside a patch: a relative
//! path, the action to take, and the CRC-32 of the file content as it
//! was stored in the source archive. The canonical text form is
//! `path|ACTION|crc`, one record per line in the `[content]` section.

use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};

/// The action a record applies to its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Action {
    /// Add a file that does not yet exist
    Add,
    /// Update an existing file
    Upd,
    /// Delete an existing file
    Del,
    /// Informational entry, not applied to the target tree
    Info,
}

/// A single file-level change: `(action, path, crc)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    action: Action,
    path: String,
    crc: u32,
}

impl Record {
    /// Create a record, validating the path
    ///
    /// `DEL` records carry a CRC of zero.
    pub fn new(action: Action, path: impl Into<String>, crc: u32) -> Result<Self> {
        let path = path.into();
        validate_path(&path)?;
        if action == Action::Del && crc != 0 {
            return Err(Error::MalformedRecord(format!(
                "DEL record must carry a zero CRC: {}",
                path
            )));
        }
        Ok(Self { action, path, crc })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Forward-slash-delimited relative path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// CRC-32 of the file content as stored in the source archive
    pub fn crc(&self) -> u32 {
        self.crc
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.path, self.action, self.crc)
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split('|').collect();
        if fields.len() != 3 {
            return Err(Error::MalformedRecord(format!(
                "expected path|ACTION|crc: {}",
                s
            )));
        }
        let path = fields[0].trim();
        let action = fields[1]
            .trim()
            .parse::<Action>()
            .map_err(|_| Error::MalformedRecord(format!("unknown action: {}", fields[1].trim())))?;
        let crc = fields[2]
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::MalformedRecord(format!("invalid CRC: {}", fields[2].trim())))?;
        Record::new(action, path, crc)
    }
}

/// Validate a forward-slash-delimited relative path
///
/// Rejects empty paths, backslashes, absolute paths, and empty, `.` or
/// `..` segments.
pub(crate) fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::MalformedRecord("empty record path".to_string()));
    }
    if path.contains('\\') {
        return Err(Error::MalformedRecord(format!(
            "path contains a backslash: {}",
            path
        )));
    }
    if path.starts_with('/') {
        return Err(Error::MalformedRecord(format!(
            "path must be relative: {}",
            path
        )));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::MalformedRecord(format!(
                "invalid path segment '{}' in: {}",
                segment, path
            )));
        }
    }
    Ok(())
}
