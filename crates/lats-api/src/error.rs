//! Error type and axum `IntoResponse` implementation.
//!
//! Only a failed sign-in changes the HTTP status. Everything the provider
//! rejects is still a `200` carrying the `{ ok: false, ... }` envelope.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error(transparent)]
  Provider(#[from] lats_provider::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"lats\""),
        );
        res
      }
      Error::Provider(e) => Json(e.to_response::<()>()).into_response(),
    }
  }
}
