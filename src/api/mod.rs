//! Client for the CurseForge upload API
//!
//! Only the three endpoints the publish workflow needs are covered: listing
//! version types, listing versions and uploading a file.

pub mod client;
pub mod error;
pub mod metadata;
pub mod response;

pub use client::{API_TOKEN_HEADER, ApiClient, ApiClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use metadata::{ProjectRelation, Relations, UploadMetadata, UploadTarget};
pub use response::{ApiResponse, RawResponse, ResponseKind, Success};

use crate::core::model::{Artifact, GameVersion, GameVersionType, UploadResult};
use async_trait::async_trait;

/// The remote operations the publish workflow depends on.
///
/// [`ApiClient`] is the production implementation. Implementations must be
/// safe to share between concurrently running publications.
#[async_trait]
pub trait FileHostApi: Send + Sync {
    /// `GET /api/game/version-types`
    async fn get_game_version_types(&self)
    -> Result<ApiResponse<Vec<GameVersionType>>, ApiError>;

    /// `GET /api/game/versions`
    async fn get_game_versions(&self) -> Result<ApiResponse<Vec<GameVersion>>, ApiError>;

    /// `POST /api/projects/{project_id}/upload-file`
    ///
    /// Exactly one of `parent_file_id` and `game_version_ids` must be set;
    /// anything else fails with [`ApiError::InvalidUploadTarget`] before a
    /// request is made.
    async fn upload_file(
        &self,
        artifact: &Artifact,
        project_id: &str,
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    ) -> Result<ApiResponse<UploadResult>, ApiError>;
}
