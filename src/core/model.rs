//! Core types for CurseForge publishing
//!
//! This module defines the plain, already-resolved values the publish
//! workflow operates on: remote reference data, version tags, artifacts
//! and publications.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// ============================================================================
// Remote reference data
// ============================================================================

/// A category of version tag recognized by CurseForge (the API calls these
/// "game dependencies"), e.g. `java`, `modloader` or `minecraft-1-20`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersionType {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// A concrete version tag belonging to exactly one [`GameVersionType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersion {
    pub id: u64,
    #[serde(rename = "gameVersionTypeID")]
    pub game_version_type_id: u64,
    pub slug: String,
    pub name: String,
    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,
}

/// Response body of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Remote file id assigned by CurseForge
    pub id: u64,
}

// ============================================================================
// Version tags
// ============================================================================

/// A `(type, version)` slug pair a publication claims to support.
///
/// Not understood by the remote service directly: it is resolved to a
/// [`GameVersion::id`] by matching `kind` against a type slug and `version`
/// against a version slug within that type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
}

impl VersionTag {
    pub fn new(kind: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            version: version.into(),
        }
    }

    /// Tag for a Java language level, e.g. `java`/`java-17`.
    pub fn java(major_version: u32) -> Self {
        Self::new("java", format!("java-{major_version}"))
    }

    /// Tag for a mod loader, e.g. `modloader`/`forge`.
    pub fn loader(loader: impl Into<String>) -> Self {
        Self::new("modloader", loader)
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.version)
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Release channel of an uploaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Alpha,
    Beta,
    #[default]
    Release,
}

/// Markup of a changelog's content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogFormat {
    #[default]
    Text,
    Markdown,
    Html,
}

/// Changelog attached to an uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub format: ChangelogFormat,
    #[serde(default)]
    pub content: String,
}

/// Kind of link from an artifact to another CurseForge project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationType {
    EmbeddedLibrary,
    Incompatible,
    OptionalDependency,
    RequiredDependency,
    Tool,
}

/// A declared relation to another project, identified by its slug
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
}

impl Relation {
    pub fn new(slug: impl Into<String>, kind: RelationType) -> Self {
        Self {
            slug: slug.into(),
            kind,
        }
    }
}

/// A single file to upload, together with its per-file metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub file: PathBuf,
    pub display_name: Option<String>,
    pub release_type: ReleaseType,
    pub changelog: Changelog,
    pub relations: BTreeSet<Relation>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            display_name: None,
            release_type: ReleaseType::default(),
            changelog: Changelog::default(),
            relations: BTreeSet::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_release_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = release_type;
        self
    }

    pub fn with_changelog(mut self, format: ChangelogFormat, content: impl Into<String>) -> Self {
        self.changelog = Changelog {
            format,
            content: content.into(),
        };
        self
    }

    pub fn with_relation(mut self, slug: impl Into<String>, kind: RelationType) -> Self {
        self.relations.insert(Relation::new(slug, kind));
        self
    }

    /// File name sent in the multipart `Content-Disposition` header.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

// ============================================================================
// Publications
// ============================================================================

/// Name conventionally given to the primary artifact
pub const MAIN_ARTIFACT_NAME: &str = "main";

/// One logical unit of artifacts and metadata uploaded to a CurseForge
/// project together.
///
/// The primary artifact establishes the file root; secondary artifacts are
/// uploaded as its children instead of carrying their own version tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub name: String,
    pub project_id: String,
    pub version_tags: BTreeSet<VersionTag>,
    pub java_versions: BTreeSet<u32>,
    pub main_artifact: Option<Artifact>,
    pub secondary_artifacts: Vec<Artifact>,
}

impl Publication {
    pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            version_tags: BTreeSet::new(),
            java_versions: BTreeSet::new(),
            main_artifact: None,
            secondary_artifacts: Vec::new(),
        }
    }

    pub fn with_version_tag(mut self, tag: VersionTag) -> Self {
        self.version_tags.insert(tag);
        self
    }

    pub fn with_java_version(mut self, major_version: u32) -> Self {
        self.java_versions.insert(major_version);
        self
    }

    pub fn with_main_artifact(mut self, artifact: Artifact) -> Self {
        self.main_artifact = Some(artifact);
        self
    }

    pub fn with_secondary_artifact(mut self, artifact: Artifact) -> Self {
        self.secondary_artifacts.push(artifact);
        self
    }

    /// Declared tags plus one synthesized `java`/`java-N` tag per Java
    /// version.
    pub fn effective_version_tags(&self) -> BTreeSet<VersionTag> {
        let mut tags = self.version_tags.clone();
        tags.extend(self.java_versions.iter().copied().map(VersionTag::java));
        tags
    }

    /// All artifacts, primary first, then secondaries in declared order.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.main_artifact
            .iter()
            .chain(self.secondary_artifacts.iter())
    }
}
