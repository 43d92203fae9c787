//! RFC 9457 problem responses shared by every module's REST layer.
//!
//! The request id is not repeated in the body; clients read it from the
//! `x-request-id` response header.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Problem details body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "Problem", description = "RFC 9457 Problem Details for HTTP APIs")]
pub struct Problem {
    /// Problem type URI; `about:blank` when none is assigned.
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// Request path the problem occurred on.
    pub instance: String,
    /// Stable machine-readable code, e.g. `DUPLICATE_ANSWER`.
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

/// One rejected input field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "ValidationError")]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer into the request body, e.g. `/text`.
    pub pointer: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_field_error(mut self, field: &str, detail: impl Into<String>) -> Self {
        self.errors.push(ValidationError {
            detail: detail.into(),
            pointer: format!("/{field}"),
        });
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// `Problem` as an axum response: status from the body, problem+json content type.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let mut resp = (status, axum::Json(self.0)).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_carries_status_and_content_type() {
        let p = Problem::new(StatusCode::CONFLICT, "Already answered", "one answer per day");
        let resp = ProblemResponse(p).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let ct = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, APPLICATION_PROBLEM_JSON);
    }

    #[test]
    fn field_errors_become_json_pointers() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Invalid input", "text is empty")
            .with_code("VALIDATION_ERROR")
            .with_instance("/v1/answers")
            .with_field_error("text", "must not be empty");

        assert_eq!(p.code, "VALIDATION_ERROR");
        assert_eq!(p.instance, "/v1/answers");
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].pointer, "/text");
    }

    #[test]
    fn empty_errors_are_omitted() {
        let v = serde_json::to_value(Problem::new(StatusCode::NOT_FOUND, "Not found", "x")).unwrap();
        assert_eq!(v["type"], "about:blank");
        assert!(v.get("errors").is_none());
    }

    #[test]
    fn out_of_range_status_falls_back_to_500() {
        let mut p = Problem::new(StatusCode::OK, "odd", "x");
        p.status = 1000;
        assert_eq!(p.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
