//! Users and their profiles.
//!
//! A profile is created in the same write as its user, so every user always
//! has exactly one. Rating aggregates are computed on read.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  rotator::{self, Rotation},
  store::BuddyStore,
};

pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_BIO_LEN: usize = 200;

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  /// Staff may force a rotation refresh.
  pub is_staff:   bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`BuddyStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  /// PHC string produced by argon2.
  pub password_hash: String,
  pub is_staff:      bool,
}

/// A user together with their stored password hash. Never serialised.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Usernames are 1–150 characters of letters, digits, and `@.+-_`.
pub fn validate_username(username: &str) -> Result<()> {
  if username.is_empty() {
    return Err(Error::InvalidInput("username must not be empty".into()));
  }
  if username.chars().count() > MAX_USERNAME_LEN {
    return Err(Error::InvalidInput(format!(
      "username must be at most {MAX_USERNAME_LEN} characters"
    )));
  }
  if let Some(bad) = username
    .chars()
    .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
  {
    return Err(Error::InvalidInput(format!(
      "username contains invalid character {bad:?}"
    )));
  }
  Ok(())
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:     Uuid,
  pub bio:         String,
  pub is_bestie:   bool,
  pub date_joined: DateTime<Utc>,
}

/// A profile with the rating aggregate of its user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
  pub username:       String,
  pub profile:        Profile,
  /// Mean score received, rounded to one decimal; `0.0` when unrated.
  pub average_rating: f64,
  pub total_ratings:  u64,
}

impl ProfileView {
  pub fn from_aggregate(
    username: String,
    profile: Profile,
    total_ratings: u64,
    mean: Option<f64>,
  ) -> Self {
    let average_rating = match mean {
      Some(m) if total_ratings > 0 => (m * 10.0).round() / 10.0,
      _ => 0.0,
    };
    Self { username, profile, average_rating, total_ratings }
  }
}

/// Partial update for [`BuddyStore::update_profile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub bio:       Option<String>,
  pub is_bestie: Option<bool>,
}

impl ProfileUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(bio) = &self.bio
      && bio.chars().count() > MAX_BIO_LEN
    {
      return Err(Error::InvalidInput(format!(
        "bio must be at most {MAX_BIO_LEN} characters"
      )));
    }
    Ok(())
  }
}

// ─── Provisioning ────────────────────────────────────────────────────────────

/// Create a user (and their profile), then fold them into the rotation for
/// the interval starting at `interval_start`.
pub async fn register_user<S, R>(
  store: &S,
  input: NewUser,
  interval_start: DateTime<Utc>,
  rng: &mut R,
) -> Result<(User, Rotation)>
where
  S: BuddyStore,
  R: Rng + Send,
{
  validate_username(&input.username)?;

  if store
    .get_credentials(&input.username)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::Conflict(format!(
      "username {:?} is already taken",
      input.username
    )));
  }

  let user = store.add_user(input).await.map_err(Error::store)?;
  tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");

  let rotation = rotator::on_user_registered(store, interval_start, rng).await?;
  Ok((user, rotation))
}
