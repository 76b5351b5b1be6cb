//! Error handling for CurseForge publishing
//!
//! This module provides the publish-level error taxonomy with recovery
//! guidance using the thiserror crate.

use crate::api::ApiError;
use crate::core::report::PublishReport;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Configuration errors
    #[error("CurseForge API token has not been provided")]
    TokenMissing,

    #[error("Publication '{publication}' has no main artifact")]
    MissingPrimaryArtifact { publication: String },

    #[error("Artifact '{artifact}' of publication '{publication}' does not exist: {}", path.display())]
    ArtifactNotFound {
        publication: String,
        artifact: String,
        path: PathBuf,
    },

    #[error("Invalid upload request: {0}")]
    InvalidUploadTarget(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Classified API outcomes
    #[error("CurseForge rejected the API token for {url} (HTTP 401). Verify that the token is valid and has upload permission")]
    Unauthorized { url: String },

    #[error("CurseForge rejected the request to {url} with HTTP {status}: {body}. The request shape may be outdated; this is likely a bug in the publisher")]
    ClientError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("CurseForge failed to process the request to {url} with HTTP {status}. The service may be having problems; try again later")]
    ServerError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    // Transport errors
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Remote side effects already happened
    #[error("Publication '{publication}' was only partially published: {source}")]
    PartialPublish {
        publication: String,
        report: Box<PublishReport>,
        #[source]
        source: Box<PublishError>,
    },
}

impl PublishError {
    /// Check if this error is worth retrying later without changing anything
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServerError { .. } | Self::Network(_))
    }

    /// Partial report of what reached the remote before the failure, if any
    pub fn partial_report(&self) -> Option<&PublishReport> {
        match self {
            Self::PartialPublish { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::TokenMissing => vec![
                "Set the CURSEFORGE_API_TOKEN environment variable",
                "Or pass --token / set repository.token in the config file",
            ],
            Self::MissingPrimaryArtifact { .. } => {
                vec!["Declare a mainArtifact for the publication"]
            }
            Self::ArtifactNotFound { .. } => vec![
                "Build the project before publishing",
                "Check the artifact file paths in the config file",
            ],
            Self::InvalidUploadTarget(_) => {
                vec!["Pass either a parent file id or game version ids, not both"]
            }
            Self::ConfigError(_) => vec!["Check the configuration file"],
            Self::Unauthorized { .. } => vec![
                "Verify the API token at https://legacy.curseforge.com/account/api-tokens",
                "Check that the token belongs to an author of the project",
            ],
            Self::ClientError { .. } => vec![
                "Check the project id and version tags",
                "Report the response body to the publisher maintainers",
            ],
            Self::ServerError { .. } | Self::Network(_) => vec![
                "Check your internet connection",
                "Wait a while and try again",
            ],
            Self::Decode { .. } => vec!["Report the response to the publisher maintainers"],
            Self::Io { .. } => vec!["Check that the file exists and is readable"],
            Self::PartialPublish { .. } => vec![
                "The main file is already live on CurseForge",
                "Upload the remaining files manually or delete the main file before retrying",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenMissing => "TOKEN_MISSING",
            Self::MissingPrimaryArtifact { .. } => "MISSING_PRIMARY_ARTIFACT",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::InvalidUploadTarget(_) => "INVALID_UPLOAD_TARGET",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::ClientError { .. } => "CLIENT_ERROR",
            Self::ServerError { .. } => "SERVER_ERROR",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::PartialPublish { .. } => "PARTIAL_PUBLISH",
        }
    }
}

impl From<ApiError> for PublishError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::TokenMissing => Self::TokenMissing,
            ApiError::InvalidToken | ApiError::InvalidBaseUrl { .. } => {
                Self::ConfigError(error.to_string())
            }
            ApiError::InvalidUploadTarget(_) => Self::InvalidUploadTarget(error.to_string()),
            ApiError::Io { path, source } => Self::Io { path, source },
            ApiError::Serialize(source) => Self::ConfigError(source.to_string()),
            ApiError::Decode { url, source } => Self::Decode {
                url,
                message: source.to_string(),
            },
            ApiError::Network(source) => Self::Network(source),
        }
    }
}
