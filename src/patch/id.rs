// src/patch/id.rs

//! Patch identifiers and version ordering
//!
//! A patch is identified by `name-version`, e.g. `fuse-karaf-6.2.1` or
//! `wildfly-patch-1.0.0.SP1`. The version is a dotted sequence of
//! components compared componentwise: numeric components numerically,
//! textual components lexicographically. The resulting order on
//! identifiers is total and is used everywhere downstream — repository
//! queries return newest-first, latest-only filters keep the maximum.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A single version component
///
/// Numeric components order before textual ones at the same position,
/// so `1.0 < 1.0.SP1` and `2.0 < 2.0.redhat-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Component {
    Numeric(u64),
    Text(String),
}

/// A patch version: an ordered sequence of numeric/textual components
///
/// Components are separated by `.` or `-`. Equality and ordering are
/// structural over the components; `Display` reproduces the originally
/// parsed text byte-for-byte.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    components: Vec<Component>,
}

impl Version {
    /// Parse a version string
    ///
    /// The string must begin with an ASCII digit and contain no
    /// whitespace or empty components.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::MalformedId("empty version".to_string()));
        }
        if !s.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::MalformedId(format!(
                "version must begin with a digit: {}",
                s
            )));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(Error::MalformedId(format!(
                "version contains whitespace: {}",
                s
            )));
        }

        let mut components = Vec::new();
        for part in s.split(['.', '-']) {
            if part.is_empty() {
                return Err(Error::MalformedId(format!(
                    "empty version component in: {}",
                    s
                )));
            }
            components.push(Component::parse(part));
        }

        Ok(Self {
            raw: s.to_string(),
            components,
        })
    }
}

impl Component {
    fn parse(part: &str) -> Self {
        if part.bytes().all(|b| b.is_ascii_digit()) {
            // Overflowing digit runs degrade to textual comparison
            match part.parse::<u64>() {
                Ok(n) => return Component::Numeric(n),
                Err(_) => return Component::Text(part.to_string()),
            }
        }
        Component::Text(part.to_string())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Componentwise; a strict prefix orders before its extension
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// A patch identifier: `name-version`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchId {
    name: String,
    version: Version,
}

impl PatchId {
    /// Create an identifier from an already-parsed name and version
    pub fn new(name: impl Into<String>, version: Version) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::MalformedId("empty patch name".to_string()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::MalformedId(format!(
                "patch name contains whitespace: {}",
                name
            )));
        }
        Ok(Self { name, version })
    }

    /// Parse `name-version`, splitting on the last `-` whose suffix
    /// begins with a digit
    ///
    /// `fuse-karaf-6.2.1` parses as name `fuse-karaf`, version `6.2.1`;
    /// `foo-1.0-SNAPSHOT` parses as name `foo`, version `1.0-SNAPSHOT`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut split = None;
        for (pos, _) in s.match_indices('-') {
            if s[pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                split = Some(pos);
            }
        }
        let pos = split.ok_or_else(|| {
            Error::MalformedId(format!("no version in patch id: {}", s))
        })?;
        if pos == 0 {
            return Err(Error::MalformedId(format!("empty patch name: {}", s)));
        }
        let version = Version::parse(&s[pos + 1..])?;
        Self::new(&s[..pos], version)
    }

    /// Parse an identifier from a file name, stripping a trailing
    /// `.zip` or `.metadata` suffix
    pub fn from_file_name(name: &str) -> Result<Self> {
        let base = name
            .strip_suffix(".zip")
            .or_else(|| name.strip_suffix(".metadata"))
            .unwrap_or(name);
        Self::parse(base)
    }

    /// Parse an identifier from the final segment of a path
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::MalformedId(format!("no file name in path: {}", path.display()))
            })?;
        Self::from_file_name(name)
    }

    /// The patch name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The patch version
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl Ord for PatchId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for PatchId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

impl FromStr for PatchId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PatchId::parse(s)
    }
}
