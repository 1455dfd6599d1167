// src/patch/metadata.rs

//! Patch metadata value objects
//!
//! Metadata is assembled through a builder, validated once at `build()`,
//! and immutable afterwards. Dependency and role collections behave as
//! sets but preserve insertion order for emission.

use crate::error::{Error, Result};
use crate::patch::PatchId;

/// Immutable description of a patch: id, optional one-off parent,
/// dependencies, roles, and post-install commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMetadata {
    patch_id: PatchId,
    oneoff_id: Option<PatchId>,
    dependencies: Vec<PatchId>,
    roles: Vec<String>,
    post_commands: Vec<String>,
}

impl PatchMetadata {
    /// Start building metadata for the given patch id
    pub fn builder(patch_id: PatchId) -> PatchMetadataBuilder {
        PatchMetadataBuilder::new(patch_id)
    }

    pub fn patch_id(&self) -> &PatchId {
        &self.patch_id
    }

    /// The patch this one-off amends, if any
    pub fn oneoff_id(&self) -> Option<&PatchId> {
        self.oneoff_id.as_ref()
    }

    /// Dependencies in insertion order, without duplicates
    pub fn dependencies(&self) -> &[PatchId] {
        &self.dependencies
    }

    /// Roles in insertion order, without duplicates
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Post-install commands, ordered
    pub fn post_commands(&self) -> &[String] {
        &self.post_commands
    }

    /// The repository-facing projection of this metadata
    ///
    /// The repository stores patches but does not authorize; roles are
    /// not part of the projection.
    pub fn to_package(&self) -> PackageMetadata {
        PackageMetadata {
            patch_id: self.patch_id.clone(),
            oneoff_id: self.oneoff_id.clone(),
            dependencies: self.dependencies.clone(),
            post_commands: self.post_commands.clone(),
        }
    }
}

/// Builder for [`PatchMetadata`]
///
/// All validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PatchMetadataBuilder {
    patch_id: PatchId,
    oneoff_id: Option<PatchId>,
    dependencies: Vec<PatchId>,
    roles: Vec<String>,
    post_commands: Vec<String>,
}

impl PatchMetadataBuilder {
    pub fn new(patch_id: PatchId) -> Self {
        Self {
            patch_id,
            oneoff_id: None,
            dependencies: Vec::new(),
            roles: Vec::new(),
            post_commands: Vec::new(),
        }
    }

    /// Mark this patch as a one-off amending `oneoff_id`
    pub fn oneoff(mut self, oneoff_id: PatchId) -> Self {
        self.oneoff_id = Some(oneoff_id);
        self
    }

    /// Add a dependency; duplicates are ignored
    pub fn dependency(mut self, id: PatchId) -> Self {
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    /// Add a role; duplicates are ignored
    pub fn role(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Append a post-install command
    pub fn post_command(mut self, command: impl Into<String>) -> Self {
        self.post_commands.push(command.into());
        self
    }

    /// Validate and freeze the metadata
    pub fn build(self) -> Result<PatchMetadata> {
        if let Some(oneoff) = &self.oneoff_id {
            if oneoff.name() != self.patch_id.name() {
                return Err(Error::InvalidMetadata(format!(
                    "one-off {} does not share a name with {}",
                    oneoff, self.patch_id
                )));
            }
            if oneoff.version() >= self.patch_id.version() {
                return Err(Error::InvalidMetadata(format!(
                    "one-off {} is not older than {}",
                    oneoff, self.patch_id
                )));
            }
        }
        if self.dependencies.contains(&self.patch_id) {
            return Err(Error::InvalidMetadata(format!(
                "{} depends on itself",
                self.patch_id
            )));
        }
        for role in &self.roles {
            if role.is_empty() || role.contains(',') || role.contains(['\n', '\r']) {
                return Err(Error::InvalidMetadata(format!("invalid role: {:?}", role)));
            }
        }
        for command in &self.post_commands {
            if command.contains(['\n', '\r']) {
                return Err(Error::InvalidMetadata(format!(
                    "command contains a line terminator: {:?}",
                    command
                )));
            }
        }
        Ok(PatchMetadata {
            patch_id: self.patch_id,
            oneoff_id: self.oneoff_id,
            dependencies: self.dependencies,
            roles: self.roles,
            post_commands: self.post_commands,
        })
    }
}

/// Repository-facing patch metadata: everything but roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    patch_id: PatchId,
    oneoff_id: Option<PatchId>,
    dependencies: Vec<PatchId>,
    post_commands: Vec<String>,
}

impl PackageMetadata {
    /// Start building package metadata for the given patch id
    pub fn builder(patch_id: PatchId) -> PackageMetadataBuilder {
        PackageMetadataBuilder {
            inner: PatchMetadataBuilder::new(patch_id),
        }
    }

    pub fn patch_id(&self) -> &PatchId {
        &self.patch_id
    }

    pub fn oneoff_id(&self) -> Option<&PatchId> {
        self.oneoff_id.as_ref()
    }

    pub fn dependencies(&self) -> &[PatchId] {
        &self.dependencies
    }

    pub fn post_commands(&self) -> &[String] {
        &self.post_commands
    }

    /// Expand into full patch metadata with an empty role set
    pub fn to_patch_metadata(&self) -> Result<PatchMetadata> {
        let mut builder = PatchMetadataBuilder::new(self.patch_id.clone());
        if let Some(oneoff) = &self.oneoff_id {
            builder = builder.oneoff(oneoff.clone());
        }
        for dep in &self.dependencies {
            builder = builder.dependency(dep.clone());
        }
        for cmd in &self.post_commands {
            builder = builder.post_command(cmd.clone());
        }
        builder.build()
    }
}

/// Builder for [`PackageMetadata`]
#[derive(Debug, Clone)]
pub struct PackageMetadataBuilder {
    inner: PatchMetadataBuilder,
}

impl PackageMetadataBuilder {
    pub fn oneoff(mut self, oneoff_id: PatchId) -> Self {
        self.inner = self.inner.oneoff(oneoff_id);
        self
    }

    pub fn dependency(mut self, id: PatchId) -> Self {
        self.inner = self.inner.dependency(id);
        self
    }

    pub fn post_command(mut self, command: impl Into<String>) -> Self {
        self.inner = self.inner.post_command(command);
        self
    }

    pub fn build(self) -> Result<PackageMetadata> {
        Ok(self.inner.build()?.to_package())
    }
}
