//! Wire model of the `metadata` part of an upload request

use super::ApiError;
use crate::core::model::{Artifact, ChangelogFormat, RelationType, ReleaseType};
use serde::{Deserialize, Serialize};

/// Where an uploaded file is attached: either a root file carrying its own
/// game versions, or a child of an already uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    GameVersions(Vec<u64>),
    Parent(u64),
}

impl UploadTarget {
    /// Build a target from the two optional upload parameters, rejecting
    /// requests that set both or neither.
    pub fn from_parts(
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    ) -> Result<Self, ApiError> {
        match (parent_file_id, game_version_ids) {
            (Some(parent), None) => Ok(Self::Parent(parent)),
            (None, Some(ids)) => Ok(Self::GameVersions(ids)),
            (Some(_), Some(_)) => Err(ApiError::InvalidUploadTarget("both")),
            (None, None) => Err(ApiError::InvalidUploadTarget("neither")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRelation {
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    pub projects: Vec<ProjectRelation>,
}

/// JSON document sent as the `metadata` part of `upload-file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub changelog: String,
    #[serde(rename = "changelogType")]
    pub changelog_type: ChangelogFormat,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "parentFileID")]
    pub parent_file_id: Option<u64>,
    #[serde(rename = "gameVersions")]
    pub game_versions: Option<Vec<u64>>,
    #[serde(rename = "releaseType")]
    pub release_type: ReleaseType,
    pub relations: Option<Relations>,
}

impl UploadMetadata {
    /// Metadata for an artifact, not yet attached to a target.
    pub fn from_artifact(artifact: &Artifact) -> Self {
        let projects: Vec<ProjectRelation> = artifact
            .relations
            .iter()
            .map(|relation| ProjectRelation {
                slug: relation.slug.clone(),
                kind: relation.kind,
            })
            .collect();

        Self {
            changelog: artifact.changelog.content.clone(),
            changelog_type: artifact.changelog.format,
            display_name: artifact.display_name.clone(),
            parent_file_id: None,
            game_versions: None,
            release_type: artifact.release_type,
            relations: (!projects.is_empty()).then_some(Relations { projects }),
        }
    }

    pub fn with_target(mut self, target: &UploadTarget) -> Self {
        match target {
            UploadTarget::GameVersions(ids) => {
                self.game_versions = Some(ids.clone());
                self.parent_file_id = None;
            }
            UploadTarget::Parent(parent) => {
                self.parent_file_id = Some(*parent);
                self.game_versions = None;
            }
        }
        self
    }
}
