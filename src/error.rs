//! Unified application error model and mapping helpers.
//! Every failure a request can hit is one `SchoolError` variant; the HTTP layer renders
//! it as `{"error": "Error: <message>"}` with a status picked by the configured policy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::directory::CourseId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchoolError {
    #[error("Email and password do not match a student or a teacher")]
    CredentialsNotMatched,
    #[error("Teacher token not found")]
    TeacherTokenNotFound,
    #[error("Student token not found")]
    StudentTokenNotFound,
    #[error("This teacher does not teach this course")]
    TeacherDoesNotTeachCourse,
    #[error("This student is not enrolled in this course")]
    StudentNotEnrolledInCourse,
    #[error("Course not found")]
    CourseNotFound(CourseId),
    #[error("No person is registered with this email")]
    PersonNotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type SchoolResult<T> = Result<T, SchoolError>;

/// How failures are mapped to HTTP status codes.
///
/// `Uniform` answers every failure with 500, the behaviour existing clients were written
/// against. `Semantic` distinguishes authentication, authorization, lookup and input errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    #[default]
    Uniform,
    Semantic,
}

impl SchoolError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SchoolError::CredentialsNotMatched => "credentials_not_matched",
            SchoolError::TeacherTokenNotFound => "teacher_token_not_found",
            SchoolError::StudentTokenNotFound => "student_token_not_found",
            SchoolError::TeacherDoesNotTeachCourse => "teacher_does_not_teach_course",
            SchoolError::StudentNotEnrolledInCourse => "student_not_enrolled_in_course",
            SchoolError::CourseNotFound(_) => "course_not_found",
            SchoolError::PersonNotFound => "person_not_found",
            SchoolError::BadRequest(_) => "bad_request",
        }
    }

    /// Map to HTTP status code under the given policy.
    pub fn http_status(&self, policy: StatusPolicy) -> StatusCode {
        if policy == StatusPolicy::Uniform {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            SchoolError::CredentialsNotMatched
            | SchoolError::TeacherTokenNotFound
            | SchoolError::StudentTokenNotFound => StatusCode::UNAUTHORIZED,
            SchoolError::TeacherDoesNotTeachCourse | SchoolError::StudentNotEnrolledInCourse => StatusCode::FORBIDDEN,
            SchoolError::CourseNotFound(_) | SchoolError::PersonNotFound => StatusCode::NOT_FOUND,
            SchoolError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// JSON failure envelope. The `Error: ` prefix is part of the wire contract.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": format!("Error: {}", self) })
    }

    pub fn with_policy(self, policy: StatusPolicy) -> ApiError {
        ApiError { error: self, policy }
    }
}

/// A `SchoolError` bound to the status policy of the server that produced it.
#[derive(Debug)]
pub struct ApiError {
    pub error: SchoolError,
    pub policy: StatusPolicy,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.http_status(self.policy);
        tracing::warn!(target: "gradebook::http", code = self.error.code_str(), status = status.as_u16(), "request failed: {}", self.error);
        (status, Json(self.error.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_policy_is_always_500() {
        let all = [
            SchoolError::CredentialsNotMatched,
            SchoolError::TeacherTokenNotFound,
            SchoolError::StudentTokenNotFound,
            SchoolError::TeacherDoesNotTeachCourse,
            SchoolError::StudentNotEnrolledInCourse,
            SchoolError::CourseNotFound(9),
            SchoolError::PersonNotFound,
            SchoolError::BadRequest("x".into()),
        ];
        for e in all {
            assert_eq!(e.http_status(StatusPolicy::Uniform), StatusCode::INTERNAL_SERVER_ERROR, "{}", e.code_str());
        }
    }

    #[test]
    fn semantic_policy_mapping() {
        assert_eq!(SchoolError::TeacherTokenNotFound.http_status(StatusPolicy::Semantic), StatusCode::UNAUTHORIZED);
        assert_eq!(SchoolError::CredentialsNotMatched.http_status(StatusPolicy::Semantic), StatusCode::UNAUTHORIZED);
        assert_eq!(SchoolError::TeacherDoesNotTeachCourse.http_status(StatusPolicy::Semantic), StatusCode::FORBIDDEN);
        assert_eq!(SchoolError::StudentNotEnrolledInCourse.http_status(StatusPolicy::Semantic), StatusCode::FORBIDDEN);
        assert_eq!(SchoolError::CourseNotFound(1).http_status(StatusPolicy::Semantic), StatusCode::NOT_FOUND);
        assert_eq!(SchoolError::BadRequest("bad".into()).http_status(StatusPolicy::Semantic), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn body_carries_error_prefix() {
        let body = SchoolError::TeacherTokenNotFound.body();
        assert_eq!(body["error"], "Error: Teacher token not found");
        assert!(body.get("data").is_none());

        let body = SchoolError::BadRequest("missing field `note`".into()).body();
        assert_eq!(body["error"], "Error: Invalid request: missing field `note`");
    }
}
