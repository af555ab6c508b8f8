//! RFC 7807 problem responses.
//!
//! # Invariants
//! - Every error leaving the router is `application/problem+json`.
//! - `correlation_id` echoes `x-request-id` when the caller sent one,
//!   otherwise it is a fresh v4 UUID.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use datajpa_core::{ParseSortError, RepoError};
use log::error;
use serde::Serialize;
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiProblem>;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_CHARS: usize = 128;

#[derive(Debug)]
pub struct ApiProblem {
    status: StatusCode,
    title: &'static str,
    kind: &'static str,
    detail: String,
    correlation_id: String,
}

impl ApiProblem {
    pub fn from_repo(err: RepoError) -> Self {
        match err {
            RepoError::Validation(detail) => Self::validation(detail.to_string()),
            RepoError::InvalidTeam(detail) => Self::validation(detail.to_string()),
            RepoError::ConstraintViolation(detail) => Self::new(
                StatusCode::CONFLICT,
                "Conflict",
                "https://datajpa.dev/problems/conflict",
                detail,
            ),
            other => {
                error!(
                    "event=request_failed module=web status=error error={}",
                    other
                );
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error",
                    "https://datajpa.dev/problems/storage",
                    "member store is unavailable",
                )
            }
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            "https://datajpa.dev/problems/validation",
            detail,
        )
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Not found",
            "https://datajpa.dev/problems/not-found",
            detail,
        )
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            "https://datajpa.dev/problems/internal",
            detail,
        )
    }

    /// Replaces the generated correlation id with the caller's request id.
    pub fn with_request_id(mut self, headers: &HeaderMap) -> Self {
        if let Some(request_id) = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_CHARS)
        {
            self.correlation_id = request_id.to_string();
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(
        status: StatusCode,
        title: &'static str,
        kind: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            title,
            kind,
            detail: detail.into(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }
}

impl From<RepoError> for ApiProblem {
    fn from(err: RepoError) -> Self {
        Self::from_repo(err)
    }
}

impl From<ParseSortError> for ApiProblem {
    fn from(err: ParseSortError) -> Self {
        Self::validation(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    status: u16,
    detail: String,
    correlation_id: String,
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let payload = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            correlation_id: self.correlation_id,
        };

        let mut response = (self.status, Json(payload)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::ApiProblem;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use datajpa_core::{MemberValidationError, RepoError, TeamValidationError};

    #[test]
    fn repo_errors_map_to_http_statuses() {
        let validation =
            ApiProblem::from_repo(RepoError::Validation(MemberValidationError::BlankUsername));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let invalid_team =
            ApiProblem::from_repo(RepoError::InvalidTeam(TeamValidationError::BlankName));
        assert_eq!(invalid_team.status(), StatusCode::BAD_REQUEST);

        let conflict = ApiProblem::from_repo(RepoError::ConstraintViolation("fk".to_string()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let storage = ApiProblem::from_repo(RepoError::MissingRequiredTable("members"));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn request_id_header_overrides_generated_correlation_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req-42"));

        let problem = ApiProblem::not_found("missing").with_request_id(&headers);
        assert_eq!(problem.correlation_id, "req-42");

        let generated = ApiProblem::not_found("missing").with_request_id(&HeaderMap::new());
        assert_eq!(generated.correlation_id.len(), 36);
    }
}
