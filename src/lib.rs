//! Publish mod files to CurseForge.
//!
//! A publication is a main artifact plus optional secondary artifacts. The
//! main artifact is uploaded with its resolved game version ids and every
//! secondary artifact is uploaded as its child.
//!
//! ```no_run
//! use curseforge_publisher::api::ApiClient;
//! use curseforge_publisher::orchestration::CurseForgePublisher;
//! use curseforge_publisher::{Artifact, Publication, VersionTag};
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), curseforge_publisher::PublishError> {
//! let client = ApiClient::new(SecretString::new("token".into()))?;
//! let publication = Publication::new("fabric", "12345")
//!     .with_version_tag(VersionTag::loader("fabric"))
//!     .with_java_version(17)
//!     .with_main_artifact(Artifact::new("main", "build/libs/mod.jar"));
//!
//! let report = CurseForgePublisher::new(Arc::new(client))
//!     .publish(&publication)
//!     .await?;
//! println!("uploaded file {:?}", report.main_file_id());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod core;
pub mod orchestration;
pub mod security;

pub use api::{ApiClient, ApiClientConfig, ApiError, ApiResponse, FileHostApi};
pub use crate::core::*;
pub use orchestration::{
    BatchPublishOptions, BatchPublishResult, BatchPublisher, CurseForgePublisher,
};
pub use security::SecureTokenManager;
