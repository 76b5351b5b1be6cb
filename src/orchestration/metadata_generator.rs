//! Sidecar upload-metadata files
//!
//! Writes `<artifact file>.metadata.json` next to every artifact so the
//! exact `metadata` part of each upload can be inspected before publishing.

use crate::api::UploadMetadata;
use crate::core::error::PublishError;
use crate::core::model::{Artifact, Publication};
use std::ffi::OsString;
use std::path::PathBuf;

/// Path of the sidecar file for an artifact
pub fn metadata_path(artifact: &Artifact) -> PathBuf {
    let mut path = OsString::from(artifact.file.as_os_str());
    path.push(".metadata.json");
    PathBuf::from(path)
}

/// Write a sidecar for every artifact of the publication, main first.
///
/// The target fields (`parentFileID`, `gameVersions`) are left null; they
/// are only known at upload time.
pub async fn generate_metadata_files(
    publication: &Publication,
) -> Result<Vec<PathBuf>, PublishError> {
    if publication.main_artifact.is_none() {
        return Err(PublishError::MissingPrimaryArtifact {
            publication: publication.name.clone(),
        });
    }

    let mut written = Vec::new();
    for artifact in publication.artifacts() {
        let path = metadata_path(artifact);
        let metadata = UploadMetadata::from_artifact(artifact);
        let json = serde_json::to_string_pretty(&metadata).map_err(|e| {
            PublishError::ConfigError(format!("Failed to serialize metadata: {}", e))
        })?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(
            publication = %publication.name,
            artifact = %artifact.name,
            path = %path.display(),
            "Wrote metadata file"
        );
        written.push(path);
    }

    Ok(written)
}
