//! Per-publication outcome reporting

use crate::core::model::VersionTag;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a single artifact upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ArtifactStatus {
    Uploaded { file_id: u64 },
    Failed { error: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub name: String,
    pub file: PathBuf,
    pub status: ArtifactStatus,
}

impl ArtifactReport {
    pub fn file_id(&self) -> Option<u64> {
        match self.status {
            ArtifactStatus::Uploaded { file_id } => Some(file_id),
            _ => None,
        }
    }
}

/// A version tag that could not be matched against CurseForge's reference
/// data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum TagMiss {
    UnknownType { tag: VersionTag },
    UnknownVersion { tag: VersionTag, available: Vec<String> },
}

impl TagMiss {
    pub fn tag(&self) -> &VersionTag {
        match self {
            Self::UnknownType { tag } | Self::UnknownVersion { tag, .. } => tag,
        }
    }
}

/// Report returned after a publish operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub publication: String,
    pub project_id: String,
    pub main: ArtifactReport,
    pub secondary: Vec<ArtifactReport>,
    pub game_version_ids: Vec<u64>,
    pub unresolved_tags: Vec<TagMiss>,
    pub published_at: Option<DateTime<Utc>>,
    pub duration: u64,
}

impl PublishReport {
    pub fn main_file_id(&self) -> Option<u64> {
        self.main.file_id()
    }

    /// True only if every artifact of the publication was uploaded.
    pub fn is_complete(&self) -> bool {
        self.main.file_id().is_some() && self.secondary.iter().all(|a| a.file_id().is_some())
    }

    pub fn failed_artifacts(&self) -> impl Iterator<Item = &ArtifactReport> {
        self.secondary
            .iter()
            .filter(|a| matches!(a.status, ArtifactStatus::Failed { .. }))
    }

    pub fn pending_artifacts(&self) -> impl Iterator<Item = &ArtifactReport> {
        self.secondary
            .iter()
            .filter(|a| a.status == ArtifactStatus::NotAttempted)
    }
}
