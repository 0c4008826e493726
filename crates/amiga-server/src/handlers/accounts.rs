//! `POST /accounts/register` — unauthenticated sign-up.

use amiga_core::{
  interval,
  rotator::RotationStatus,
  store::BuddyStore,
  user::{NewUser, User, register_user},
};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::hash_password, error::Error};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
  pub user:     User,
  pub rotation: RotationStatus,
  pub message:  String,
}

/// Create the account, then rebuild the current rotation so the newcomer is
/// part of it. Returns 201.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let input = NewUser {
    password_hash: hash_password(&body.password)?,
    username:      body.username,
    is_staff:      false,
  };

  let interval_start = interval::current_interval_start(state.config.anchor, Utc::now());
  let mut rng = StdRng::from_entropy();
  let (user, rotation) =
    register_user(state.store.as_ref(), input, interval_start, &mut rng).await?;

  let message = format!("Account created for {}!", user.username);
  Ok((
    StatusCode::CREATED,
    Json(Registered { user, rotation: rotation.status(), message }),
  ))
}
