//! Error replies of the Progress Engine. Every failure is `{"error": "..."}` plus a status.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

use crate::protocol::ErrorOut;

/// Message the client matches (case-insensitively) to detect a stale session.
pub const STUDENT_NOT_FOUND: &str = "Student not found";

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
}

impl ApiError {
  pub fn student_not_found() -> Self {
    ApiError::NotFound(STUDENT_NOT_FOUND.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    tracing::debug!(target: "edusmart", %status, error = %self, "request rejected");
    (status, Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
