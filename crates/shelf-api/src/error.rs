//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use shelf_core::validation::FieldErrors;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("conflict: {0}")]
  Conflict(String),

  /// Rendered as `422` with `{"errors": {field: [messages]}}`.
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<shelf_core::Error> for ApiError {
  fn from(e: shelf_core::Error) -> Self {
    use shelf_core::Error as E;
    match e {
      E::Validation(errors) => ApiError::Validation(errors),
      E::IncorrectPassword => {
        let mut errors = FieldErrors::new();
        errors.add("current_password", "Incorrect password");
        ApiError::Validation(errors)
      }
      E::VariantNotFound(_)
      | E::CartNotFound(_)
      | E::AddressNotFound(_)
      | E::OwnerNotFound(_) => ApiError::NotFound(e.to_string()),
      E::NoPassword(_) => ApiError::BadRequest(e.to_string()),
      E::CartConflict(_) => ApiError::Conflict(e.to_string()),
      E::Hash(_) | E::Catalog(_) | E::Store(_) => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Validation(errors) => {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors })))
          .into_response();
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
