//! HTTP Basic-auth extractor.
//!
//! A request that passes carries a [`Session`] for the matching user; the
//! provider records that user as the author of every write.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use lats_core::{Session, store::RemoteStore};
use serde::Deserialize;

use crate::{AppState, error::Error};

/// One back-office account.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Accounts accepted by this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub users: Vec<UserCredentials>,
}

impl AuthConfig {
  pub fn new(users: Vec<UserCredentials>) -> Self { Self { users } }

  fn find(&self, username: &str) -> Option<&UserCredentials> {
    self.users.iter().find(|u| u.username == username)
  }
}

/// Present in a handler means the request was authenticated as `.0`.
pub struct Authenticated(pub Session);

/// Verify Basic credentials and open a session for the user.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Session, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  let user = config.find(username).ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Session::new(username))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: RemoteStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = verify_auth(&parts.headers, &state.auth)?;
    Ok(Authenticated(session))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};

  use super::*;
  use crate::tests::{basic, hash};

  fn config() -> AuthConfig {
    AuthConfig::new(vec![
      UserCredentials { username: "clerk".into(), password_hash: hash("secret") },
      UserCredentials { username: "owner".into(), password_hash: hash("hunter2") },
    ])
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn correct_credentials_open_a_session() {
    let session = verify_auth(&headers(&basic("owner", "hunter2")), &config()).unwrap();
    assert_eq!(session.user_id, "owner");
  }

  #[test]
  fn wrong_password() {
    let result = verify_auth(&headers(&basic("clerk", "hunter2")), &config());
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let result = verify_auth(&headers(&basic("visitor", "secret")), &config());
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    assert!(matches!(verify_auth(&HeaderMap::new(), &config()), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let result = verify_auth(&headers("Basic !!!not-base64!!!"), &config());
    assert!(matches!(result, Err(Error::Unauthorized)));
  }
}
