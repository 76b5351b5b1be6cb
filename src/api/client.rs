use super::{
    ApiError, ApiResponse, FileHostApi, RawResponse, ResponseKind, UploadMetadata, UploadTarget,
};
use crate::core::model::{Artifact, GameVersion, GameVersionType, UploadResult};
use crate::security::SecureTokenManager;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url, redirect};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;

/// Production CurseForge endpoint
pub const DEFAULT_BASE_URL: &str = "https://minecraft.curseforge.com";

/// Header carrying the API token on every request
pub const API_TOKEN_HEADER: &str = "X-Api-Token";

/// Transport settings of an [`ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// How long an idle pooled connection is kept for reuse.
    ///
    /// This is not a connection-acquisition timeout: reqwest has none, so
    /// waiting for a connection is bounded only by `connect_timeout` and
    /// `read_timeout`.
    pub pool_idle_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(20),
            max_redirects: 10,
        }
    }
}

/// HTTP client for the CurseForge upload API.
///
/// Cloning is cheap and clones share one connection pool; the pool is
/// released when the last clone is dropped.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    token: Arc<SecretString>,
    http: Client,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails if the token is empty.
    pub fn new(token: SecretString) -> Result<Self, ApiError> {
        Self::with_config(token, ApiClientConfig::default())
    }

    /// # Errors
    ///
    /// Fails if the token is empty or not a valid header value, if the base
    /// URL cannot be a base, or if the TLS backend cannot be initialized.
    pub fn with_config(token: SecretString, config: ApiClientConfig) -> Result<Self, ApiError> {
        if token.expose_secret().is_empty() {
            return Err(ApiError::TokenMissing);
        }

        let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        // Test here so that path_segments_mut succeeds in endpoint()
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl {
                url: config.base_url,
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }

        let mut token_header =
            HeaderValue::from_str(token.expose_secret()).map_err(|_| ApiError::InvalidToken)?;
        token_header.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, token_header);

        let http = Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self {
            base_url,
            token: Arc::new(token),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn wrap<T>(&self, response: reqwest::Response) -> Result<ApiResponse<T>, ApiError> {
        let url = response.url().to_string();
        let status = response.status();
        let bytes = response.bytes().await?;

        tracing::debug!(%url, status = status.as_u16(), "CurseForge API response");

        // Error bodies end up in error messages; make sure the token never does.
        let body = match ResponseKind::classify(status.as_u16()) {
            ResponseKind::Success => bytes.to_vec(),
            _ => {
                let text = String::from_utf8_lossy(&bytes);
                SecureTokenManager::mask_token_in_string(&text, &self.token).into_bytes()
            }
        };

        Ok(ApiResponse::from_raw(RawResponse::new(url, status, body)))
    }

    async fn get<T>(&self, segments: &[&str]) -> Result<ApiResponse<T>, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");

        let response = self.http.get(url).send().await?;
        self.wrap(response).await
    }

    async fn upload_form(artifact: &Artifact, metadata: &UploadMetadata) -> Result<Form, ApiError> {
        let metadata_json = serde_json::to_string(metadata).map_err(ApiError::Serialize)?;
        let metadata_part = Part::text(metadata_json).mime_str("application/json")?;

        let io_error = |source| ApiError::Io {
            path: artifact.file.clone(),
            source,
        };
        let file = tokio::fs::File::open(&artifact.file).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();

        let file_part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(artifact.file_name());

        Ok(Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part))
    }
}

#[async_trait]
impl FileHostApi for ApiClient {
    async fn get_game_version_types(
        &self,
    ) -> Result<ApiResponse<Vec<GameVersionType>>, ApiError> {
        self.get(&["api", "game", "version-types"]).await
    }

    async fn get_game_versions(&self) -> Result<ApiResponse<Vec<GameVersion>>, ApiError> {
        self.get(&["api", "game", "versions"]).await
    }

    async fn upload_file(
        &self,
        artifact: &Artifact,
        project_id: &str,
        parent_file_id: Option<u64>,
        game_version_ids: Option<Vec<u64>>,
    ) -> Result<ApiResponse<UploadResult>, ApiError> {
        let target = UploadTarget::from_parts(parent_file_id, game_version_ids)?;
        let url = self.endpoint(&["api", "projects", project_id, "upload-file"])?;
        let metadata = UploadMetadata::from_artifact(artifact).with_target(&target);
        let form = Self::upload_form(artifact, &metadata).await?;

        tracing::debug!(
            %url,
            artifact = %artifact.name,
            file = %artifact.file.display(),
            "POST upload-file"
        );

        let response = self.http.post(url).multipart(form).send().await?;
        self.wrap(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RelationType;
    use axum::Router;
    use axum::extract::{Multipart, Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode, header};
    use axum::response::{IntoResponse, Redirect, Response};
    use axum::routing::{get, post};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const TOKEN: &str = "foobar-token-123";

    #[derive(Debug, Clone)]
    struct RecordedPart {
        name: String,
        file_name: Option<String>,
        content_type: Option<String>,
        data: Vec<u8>,
    }

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        path: String,
        token: Option<String>,
        parts: Vec<RecordedPart>,
    }

    #[derive(Clone, Default)]
    struct MockState {
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
        statuses: Arc<Mutex<VecDeque<u16>>>,
    }

    impl MockState {
        fn with_statuses(statuses: &[u16]) -> Self {
            let state = Self::default();
            state.statuses.lock().unwrap().extend(statuses);
            state
        }

        fn record(&self, path: String, headers: &AxumHeaders, parts: Vec<RecordedPart>) {
            let token = headers
                .get(API_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            self.requests.lock().unwrap().push(RecordedRequest { path, token, parts });
        }

        fn respond(&self, body: impl Into<String>) -> Response {
            let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
            (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                body.into(),
            )
                .into_response()
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn version_types(
        State(state): State<MockState>,
        headers: AxumHeaders,
    ) -> impl IntoResponse {
        state.record("/api/game/version-types".to_string(), &headers, Vec::new());
        state.respond(r#"[{"id":2,"name":"Java","slug":"java"},{"id":4,"name":"Minecraft1.8","slug":"minecraft-1-8"}]"#)
    }

    async fn versions(
        State(state): State<MockState>,
        headers: AxumHeaders,
    ) -> impl IntoResponse {
        state.record("/api/game/versions".to_string(), &headers, Vec::new());
        state.respond(r#"[{"id":156,"gameVersionTypeID":17,"name":"Beta1.7.3","slug":"beta-1-7-3","apiVersion":null},{"id":159,"gameVersionTypeID":1,"name":"CB1060","slug":"cb-1060","apiVersion":null}]"#)
    }

    async fn echo_token(State(state): State<MockState>, headers: AxumHeaders) -> Response {
        let token = headers
            .get(API_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        state.record("/echo/api/game/versions".to_string(), &headers, Vec::new());
        state.respond(format!(r#"{{"error":"token {token} is not allowed"}}"#))
    }

    async fn upload(
        State(state): State<MockState>,
        Path(project_id): Path<String>,
        headers: AxumHeaders,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let data = field.bytes().await.unwrap().to_vec();
            parts.push(RecordedPart {
                name,
                file_name,
                content_type,
                data,
            });
        }

        state.record(format!("/api/projects/{project_id}/upload-file"), &headers, parts);
        state.respond(r#"{"id":67890}"#)
    }

    async fn spawn_server(state: MockState) -> String {
        let app = Router::new()
            .route("/api/game/version-types", get(version_types))
            .route("/api/game/versions", get(versions))
            .route(
                "/moved/api/game/versions",
                get(|| async { Redirect::permanent("/api/game/versions") }),
            )
            .route("/echo/api/game/versions", get(echo_token))
            .route("/api/projects/{project_id}/upload-file", post(upload))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::with_config(
            SecretString::new(TOKEN.into()),
            ApiClientConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn artifact_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_get_game_versions() {
        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        let response = client.get_game_versions().await.unwrap();

        assert_eq!(response.kind(), ResponseKind::Success);
        assert!(response.raw().url.ends_with("/api/game/versions"));
        let ApiResponse::Success(success) = response else {
            panic!("expected success");
        };
        let versions = success.body().unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].game_version_type_id, 17);

        let requests = state.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/game/versions");
        assert_eq!(requests[0].token.as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn test_get_game_version_types() {
        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        let types = client
            .get_game_version_types()
            .await
            .unwrap()
            .into_body()
            .unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(types[0].slug, "java");
        assert_eq!(state.requests()[0].token.as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn test_status_classification_over_http() {
        let state = MockState::with_statuses(&[300, 401, 500]);
        let client = client(&spawn_server(state).await);

        let response = client.get_game_versions().await.unwrap();
        assert_eq!(response.status().as_u16(), 300);
        assert!(matches!(response, ApiResponse::ClientError(_)));

        let response = client.get_game_versions().await.unwrap();
        assert!(matches!(response, ApiResponse::Unauthorized(_)));

        let response = client.get_game_versions().await.unwrap();
        assert!(matches!(response, ApiResponse::ServerError(_)));
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let state = MockState::default();
        let base = spawn_server(state.clone()).await;
        let client = client(&format!("{base}/moved"));

        let response = client.get_game_versions().await.unwrap();

        assert_eq!(response.kind(), ResponseKind::Success);
        assert_eq!(state.requests()[0].path, "/api/game/versions");
    }

    #[tokio::test]
    async fn test_upload_file_with_game_versions() {
        let dir = TempDir::new().unwrap();
        let file = artifact_file(&dir, "mod-1.0.jar", b"jar-bytes");
        let artifact = Artifact::new("main", file)
            .with_display_name("Mod 1.0")
            .with_relation("fabric-api", RelationType::RequiredDependency);

        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        let result = client
            .upload_file(&artifact, "12345", None, Some(vec![8326, 10236]))
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(result.id, 67890);

        let requests = state.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/projects/12345/upload-file");
        assert_eq!(requests[0].token.as_deref(), Some(TOKEN));

        let parts = &requests[0].parts;
        assert_eq!(parts.len(), 2);

        let metadata = parts.iter().find(|p| p.name == "metadata").unwrap();
        assert_eq!(metadata.content_type.as_deref(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_slice(&metadata.data).unwrap();
        assert_eq!(json["gameVersions"], serde_json::json!([8326, 10236]));
        assert_eq!(json["parentFileID"], serde_json::Value::Null);
        assert_eq!(json["displayName"], "Mod 1.0");
        assert_eq!(json["relations"]["projects"][0]["slug"], "fabric-api");

        let file_part = parts.iter().find(|p| p.name == "file").unwrap();
        assert_eq!(file_part.file_name.as_deref(), Some("mod-1.0.jar"));
        assert_eq!(file_part.data, b"jar-bytes");
    }

    #[tokio::test]
    async fn test_upload_file_with_parent() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::new("sources", artifact_file(&dir, "mod-sources.jar", b"src"));

        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        client
            .upload_file(&artifact, "12345", Some(100), None)
            .await
            .unwrap();

        let requests = state.requests();
        let metadata = requests[0].parts.iter().find(|p| p.name == "metadata").unwrap();
        let json: serde_json::Value = serde_json::from_slice(&metadata.data).unwrap();
        assert_eq!(json["parentFileID"], 100);
        assert_eq!(json["gameVersions"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_upload_file_rejects_ambiguous_target_before_request() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::new("main", artifact_file(&dir, "mod.jar", b"x"));

        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        let both = client
            .upload_file(&artifact, "12345", Some(100), Some(vec![1]))
            .await;
        assert!(matches!(both, Err(ApiError::InvalidUploadTarget(_))));

        let neither = client.upload_file(&artifact, "12345", None, None).await;
        assert!(matches!(neither, Err(ApiError::InvalidUploadTarget(_))));

        assert!(state.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails_before_request() {
        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);
        let artifact = Artifact::new("main", "/definitely/not/here.jar");

        let result = client.upload_file(&artifact, "1", None, Some(vec![])).await;

        assert!(matches!(result, Err(ApiError::Io { .. })));
        assert!(state.requests().is_empty());
    }

    #[tokio::test]
    async fn test_error_body_does_not_leak_token() {
        let state = MockState::with_statuses(&[400]);
        let base = spawn_server(state).await;
        let client = client(&format!("{base}/echo"));

        let response = client.get_game_versions().await.unwrap();

        assert!(matches!(response, ApiResponse::ClientError(_)));
        let text = response.raw().text();
        assert!(!text.contains(TOKEN));
        assert!(text.contains(&SecureTokenManager::mask_token(TOKEN)));
    }

    #[tokio::test]
    async fn test_client_is_shareable_across_tasks() {
        let state = MockState::default();
        let client = client(&spawn_server(state.clone()).await);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get_game_version_types().await })
            })
            .collect();

        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.kind(), ResponseKind::Success);
        }
        assert_eq!(state.requests().len(), 4);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let result = ApiClient::new(SecretString::new("".into()));
        assert!(matches!(result, Err(ApiError::TokenMissing)));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = ApiClient::with_config(
            SecretString::new(TOKEN.into()),
            ApiClientConfig {
                base_url: "mailto:someone@example.com".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = client("https://example.com");
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(TOKEN));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://example.com/proxy/");
        assert_eq!(client.base_url().as_str(), "https://example.com/proxy/");
        let url = client.endpoint(&["api", "game", "versions"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/proxy/api/game/versions");

        let client = client_root();
        let url = client
            .endpoint(&["api", "projects", "12345", "upload-file"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://minecraft.curseforge.com/api/projects/12345/upload-file"
        );
    }

    fn client_root() -> ApiClient {
        ApiClient::new(SecretString::new(TOKEN.into())).unwrap()
    }
}
