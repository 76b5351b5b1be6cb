//! Classification of raw HTTP responses into typed outcomes

use super::ApiError;
use crate::core::error::PublishError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Outcome class of an API call, computed purely from the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Success,
    Unauthorized,
    ClientError,
    ServerError,
}

impl ResponseKind {
    /// Redirects count as success because the transport follows them; a
    /// 300 that reaches us was not followed and is a client error.
    pub fn classify(status: u16) -> Self {
        match status {
            200..=299 | 301..=399 => Self::Success,
            401 => Self::Unauthorized,
            500..=599 => Self::ServerError,
            _ => Self::ClientError,
        }
    }
}

/// A fully received HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Successful response whose body is decoded on demand
pub struct Success<T> {
    raw: RawResponse,
    _body: PhantomData<fn() -> T>,
}

impl<T> Success<T> {
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }
}

impl<T: DeserializeOwned> Success<T> {
    /// Decode the body as `T`. A body that does not match surfaces as
    /// [`ApiError::Decode`].
    pub fn body(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.raw.body).map_err(|source| ApiError::Decode {
            url: self.raw.url.clone(),
            source,
        })
    }
}

impl<T> fmt::Debug for Success<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Success").field("raw", &self.raw).finish()
    }
}

/// Typed result of one API call
#[derive(Debug)]
pub enum ApiResponse<T> {
    Success(Success<T>),
    Unauthorized(RawResponse),
    ClientError(RawResponse),
    ServerError(RawResponse),
}

impl<T> ApiResponse<T> {
    pub fn from_raw(raw: RawResponse) -> Self {
        match ResponseKind::classify(raw.status.as_u16()) {
            ResponseKind::Success => Self::Success(Success {
                raw,
                _body: PhantomData,
            }),
            ResponseKind::Unauthorized => Self::Unauthorized(raw),
            ResponseKind::ClientError => Self::ClientError(raw),
            ResponseKind::ServerError => Self::ServerError(raw),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Success(_) => ResponseKind::Success,
            Self::Unauthorized(_) => ResponseKind::Unauthorized,
            Self::ClientError(_) => ResponseKind::ClientError,
            Self::ServerError(_) => ResponseKind::ServerError,
        }
    }

    pub fn raw(&self) -> &RawResponse {
        match self {
            Self::Success(success) => &success.raw,
            Self::Unauthorized(raw) | Self::ClientError(raw) | Self::ServerError(raw) => raw,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.raw().status
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Decode a successful response or turn any other outcome into the
    /// matching [`PublishError`].
    pub fn into_body(self) -> Result<T, PublishError> {
        match self {
            Self::Success(success) => Ok(success.body()?),
            Self::Unauthorized(raw) => Err(PublishError::Unauthorized { url: raw.url }),
            Self::ClientError(raw) => Err(PublishError::ClientError {
                status: raw.status.as_u16(),
                body: raw.text().into_owned(),
                url: raw.url,
            }),
            Self::ServerError(raw) => Err(PublishError::ServerError {
                status: raw.status.as_u16(),
                body: raw.text().into_owned(),
                url: raw.url,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::UploadResult;

    fn response(status: u16, body: &str) -> ApiResponse<UploadResult> {
        ApiResponse::from_raw(RawResponse::new(
            "https://example.com/api/projects/1/upload-file",
            StatusCode::from_u16(status).unwrap(),
            body,
        ))
    }

    #[test]
    fn test_classify_success_ranges() {
        for status in (200..300).chain(301..400) {
            assert_eq!(ResponseKind::classify(status), ResponseKind::Success, "{status}");
        }
    }

    #[test]
    fn test_classify_unauthorized() {
        assert_eq!(ResponseKind::classify(401), ResponseKind::Unauthorized);
    }

    #[test]
    fn test_classify_server_errors() {
        for status in 500..600 {
            assert_eq!(ResponseKind::classify(status), ResponseKind::ServerError, "{status}");
        }
    }

    #[test]
    fn test_classify_client_errors() {
        assert_eq!(ResponseKind::classify(300), ResponseKind::ClientError);
        assert_eq!(ResponseKind::classify(400), ResponseKind::ClientError);
        for status in 402..500 {
            assert_eq!(ResponseKind::classify(status), ResponseKind::ClientError, "{status}");
        }
        assert_eq!(ResponseKind::classify(100), ResponseKind::ClientError);
        assert_eq!(ResponseKind::classify(600), ResponseKind::ClientError);
    }

    #[test]
    fn test_success_body_decodes() {
        let response = response(200, r#"{"id":67890}"#);

        assert_eq!(response.kind(), ResponseKind::Success);
        let ApiResponse::Success(success) = response else {
            panic!("expected success");
        };
        assert_eq!(success.body().unwrap(), UploadResult { id: 67890 });
    }

    #[test]
    fn test_success_body_decode_failure_is_distinct() {
        let ApiResponse::Success(success) = response(200, "<html>oops</html>") else {
            panic!("expected success");
        };

        assert!(matches!(success.body(), Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_into_body_maps_outcomes() {
        assert_eq!(response(201, r#"{"id":1}"#).into_body().unwrap().id, 1);

        assert!(matches!(
            response(401, "").into_body(),
            Err(PublishError::Unauthorized { .. })
        ));

        match response(422, "bad metadata").into_body() {
            Err(PublishError::ClientError { status, body, url }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "bad metadata");
                assert!(url.ends_with("/upload-file"));
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            response(502, "").into_body(),
            Err(PublishError::ServerError { status: 502, .. })
        ));
    }
}
