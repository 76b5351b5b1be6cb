use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by [`ApiClient`](super::ApiClient) before or while talking
/// to the remote API.
///
/// HTTP status outcomes are not errors at this layer: they are classified
/// into an [`ApiResponse`](super::ApiResponse) instead.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("CurseForge API token is empty")]
    TokenMissing,

    #[error("CurseForge API token contains characters that are not valid in an HTTP header")]
    InvalidToken,

    #[error("Invalid CurseForge API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Exactly one of parentFileID and gameVersions must be set for an upload, got {0}")]
    InvalidUploadTarget(&'static str),

    #[error("Failed to read artifact file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize upload metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Network(#[from] reqwest::Error),
}
