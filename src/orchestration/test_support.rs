//! In-memory [`FileHostApi`] double shared by the orchestration tests

use crate::api::{ApiError, ApiResponse, FileHostApi, RawResponse, UploadTarget};
use crate::core::model::{Artifact, GameVersion, GameVersionType, UploadResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VersionTypes,
    Versions,
    Upload {
        artifact: String,
        project_id: String,
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    },
}

pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    types_status: u16,
    versions_status: u16,
    uploads: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    next_id: AtomicU64,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            types_status: 200,
            versions_status: 200,
            uploads: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1000),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl MockApi {
    pub fn with_types_status(mut self, status: u16) -> Self {
        self.types_status = status;
        self
    }

    pub fn with_versions_status(mut self, status: u16) -> Self {
        self.versions_status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a canned upload response for a project; unqueued uploads get a
    /// fresh id.
    pub fn with_upload(self, project_id: &str, status: u16, body: &str) -> Self {
        self.uploads
            .lock()
            .unwrap()
            .entry(project_id.to_string())
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Upload { .. }))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn response<T>(path: &str, status: u16, body: impl Into<Vec<u8>>) -> ApiResponse<T> {
        ApiResponse::from_raw(RawResponse::new(
            format!("https://mock.invalid{path}"),
            StatusCode::from_u16(status).unwrap(),
            body,
        ))
    }
}

#[async_trait]
impl FileHostApi for MockApi {
    async fn get_game_version_types(
        &self,
    ) -> Result<ApiResponse<Vec<GameVersionType>>, ApiError> {
        self.calls.lock().unwrap().push(Call::VersionTypes);
        Ok(Self::response(
            "/api/game/version-types",
            self.types_status,
            r#"[{"id":1,"slug":"java","name":"Java"},{"id":2,"slug":"modloader","name":"Modloader"},{"id":3,"slug":"minecraft-1-20","name":"Minecraft 1.20"}]"#,
        ))
    }

    async fn get_game_versions(&self) -> Result<ApiResponse<Vec<GameVersion>>, ApiError> {
        self.calls.lock().unwrap().push(Call::Versions);
        Ok(Self::response(
            "/api/game/versions",
            self.versions_status,
            r#"[
                {"id":10,"gameVersionTypeID":1,"slug":"java-17","name":"Java 17"},
                {"id":11,"gameVersionTypeID":1,"slug":"java-21","name":"Java 21"},
                {"id":20,"gameVersionTypeID":2,"slug":"fabric","name":"Fabric"},
                {"id":21,"gameVersionTypeID":2,"slug":"forge","name":"Forge"},
                {"id":30,"gameVersionTypeID":3,"slug":"1-20-2","name":"1.20.2","apiVersion":null}
            ]"#,
        ))
    }

    async fn upload_file(
        &self,
        artifact: &Artifact,
        project_id: &str,
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    ) -> Result<ApiResponse<UploadResult>, ApiError> {
        UploadTarget::from_parts(parent_file_id, game_version_ids.clone())?;
        if !Path::new(&artifact.file).exists() {
            return Err(ApiError::Io {
                path: artifact.file.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        self.calls.lock().unwrap().push(Call::Upload {
            artifact: artifact.name.clone(),
            project_id: project_id.to_string(),
            parent_file_id,
            game_version_ids,
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let queued = self
            .uploads
            .lock()
            .unwrap()
            .get_mut(project_id)
            .and_then(VecDeque::pop_front);
        let (status, body) = queued.unwrap_or_else(|| {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            (200, format!(r#"{{"id":{id}}}"#))
        });

        Ok(Self::response(
            &format!("/api/projects/{project_id}/upload-file"),
            status,
            body,
        ))
    }
}
