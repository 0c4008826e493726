//! HTTP Basic-auth extractor backed by per-user argon2 hashes.

use amiga_core::{store::BuddyStore, user::User};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// The authenticated caller.
pub struct CurrentUser(pub User);

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}").into()))
}

/// Pull `(username, password)` out of an `Authorization: Basic …` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
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
  Ok((username.to_owned(), password.to_owned()))
}

/// Resolve the caller from the request headers.
pub async fn authenticate<S>(headers: &HeaderMap, store: &S) -> Result<User, Error>
where
  S: BuddyStore,
{
  let (username, password) = basic_credentials(headers)?;

  let creds = store
    .get_credentials(&username)
    .await
    .map_err(|e| Error::Internal(Box::new(e)))?
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| {
      tracing::debug!(%username, "password mismatch");
      Error::Unauthorized
    })?;

  Ok(creds.user)
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, state.store.as_ref()).await.map(CurrentUser)
  }
}
