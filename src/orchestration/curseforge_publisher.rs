//! CurseForge Publisher - orchestrator for a single publication
//!
//! Runs the publish protocol for one [`Publication`]:
//! - Local preflight (main artifact declared, files present)
//! - Reference data fetch (version types and versions)
//! - Version tag resolution
//! - Main artifact upload, then secondary uploads parented to it

use crate::api::FileHostApi;
use crate::core::error::PublishError;
use crate::core::model::{Artifact, Publication};
use crate::core::report::{ArtifactReport, ArtifactStatus, PublishReport};
use crate::orchestration::resolver::{TagResolution, resolve_version_tags};
use std::sync::Arc;
use std::time::Instant;

/// Publishes publications through a [`FileHostApi`].
///
/// The publisher holds no per-publication state, so one instance may run
/// several publications concurrently.
pub struct CurseForgePublisher<A: FileHostApi> {
    api: Arc<A>,
}

impl<A: FileHostApi> Clone for CurseForgePublisher<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: FileHostApi> CurseForgePublisher<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch reference data and resolve the publication's version tags
    /// without uploading anything.
    pub async fn resolve(&self, publication: &Publication) -> Result<TagResolution, PublishError> {
        let types = self.api.get_game_version_types().await?.into_body()?;
        let versions = self.api.get_game_versions().await?.into_body()?;

        Ok(resolve_version_tags(
            &publication.effective_version_tags(),
            &types,
            &versions,
        ))
    }

    /// Publish a publication.
    ///
    /// Fails before any network call if the main artifact is missing or
    /// any artifact file does not exist. Once the main artifact is uploaded
    /// it stays uploaded: a later secondary failure returns
    /// [`PublishError::PartialPublish`] with the report of what reached the
    /// remote.
    pub async fn publish(&self, publication: &Publication) -> Result<PublishReport, PublishError> {
        let start_time = Instant::now();

        // 1. Preflight
        let main = publication.main_artifact.as_ref().ok_or_else(|| {
            PublishError::MissingPrimaryArtifact {
                publication: publication.name.clone(),
            }
        })?;
        for artifact in publication.artifacts() {
            Self::check_exists(publication, artifact).await?;
        }

        // 2. Reference data and tag resolution
        let resolution = self.resolve(publication).await?;
        tracing::debug!(
            publication = %publication.name,
            ids = ?resolution.ids,
            misses = resolution.misses.len(),
            "Resolved version tags"
        );

        // 3. Main artifact
        let main_file_id = self
            .upload(main, &publication.project_id, None, Some(resolution.ids.clone()))
            .await?;
        tracing::info!(
            "Published main artifact (file {}) of publication '{}' to CurseForge (project {})",
            main_file_id,
            publication.name,
            publication.project_id
        );

        let mut report = PublishReport {
            publication: publication.name.clone(),
            project_id: publication.project_id.clone(),
            main: ArtifactReport {
                name: main.name.clone(),
                file: main.file.clone(),
                status: ArtifactStatus::Uploaded {
                    file_id: main_file_id,
                },
            },
            secondary: publication
                .secondary_artifacts
                .iter()
                .map(|artifact| ArtifactReport {
                    name: artifact.name.clone(),
                    file: artifact.file.clone(),
                    status: ArtifactStatus::NotAttempted,
                })
                .collect(),
            game_version_ids: resolution.ids,
            unresolved_tags: resolution.misses,
            published_at: None,
            duration: 0,
        };

        // 4. Secondary artifacts, in order, stopping at the first failure
        for (index, artifact) in publication.secondary_artifacts.iter().enumerate() {
            match self
                .upload(artifact, &publication.project_id, Some(main_file_id), None)
                .await
            {
                Ok(file_id) => {
                    tracing::info!(
                        "Published artifact '{}' (file {}) of publication '{}' to CurseForge (project {})",
                        artifact.name,
                        file_id,
                        publication.name,
                        publication.project_id
                    );
                    report.secondary[index].status = ArtifactStatus::Uploaded { file_id };
                }
                Err(error) => {
                    tracing::error!(
                        "Failed to upload artifact '{}' of publication '{}' after its main file {} was published. \
                         CurseForge project {} is now in an inconsistent state and needs manual correction: {}",
                        artifact.name,
                        publication.name,
                        main_file_id,
                        publication.project_id,
                        error
                    );
                    report.secondary[index].status = ArtifactStatus::Failed {
                        error: error.to_string(),
                    };
                    report.duration = start_time.elapsed().as_millis() as u64;

                    return Err(PublishError::PartialPublish {
                        publication: publication.name.clone(),
                        report: Box::new(report),
                        source: Box::new(error),
                    });
                }
            }
        }

        report.published_at = Some(chrono::Utc::now());
        report.duration = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            "Published publication '{}' to CurseForge (project {})",
            publication.name,
            publication.project_id
        );

        Ok(report)
    }

    async fn upload(
        &self,
        artifact: &Artifact,
        project_id: &str,
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    ) -> Result<u64, PublishError> {
        let response = self
            .api
            .upload_file(artifact, project_id, parent_file_id, game_version_ids)
            .await?;
        Ok(response.into_body()?.id)
    }

    async fn check_exists(
        publication: &Publication,
        artifact: &Artifact,
    ) -> Result<(), PublishError> {
        let is_file = tokio::fs::metadata(&artifact.file)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);

        if is_file {
            Ok(())
        } else {
            Err(PublishError::ArtifactNotFound {
                publication: publication.name.clone(),
                artifact: artifact.name.clone(),
                path: artifact.file.clone(),
            })
        }
    }
}
