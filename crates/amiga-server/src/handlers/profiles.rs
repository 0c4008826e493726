//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profiles/me` | Caller's profile with rating aggregate |
//! | `PUT`  | `/profiles/me` | Body: `{"bio":"...","is_bestie":true}`, both optional |
//! | `GET`  | `/profiles/{user_id}` | 404 if not found |

use amiga_core::{
  Error as CoreError,
  store::BuddyStore,
  user::{Profile, ProfileUpdate, ProfileView},
};
use axum::{
  Json,
  extract::{Path, State},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::Error};

async fn load<S: BuddyStore>(store: &S, user_id: Uuid) -> Result<ProfileView, Error> {
  let view = store
    .get_profile(user_id)
    .await
    .map_err(CoreError::store)?
    .ok_or(CoreError::UserNotFound(user_id))?;
  Ok(view)
}

/// `GET /profiles/{user_id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
  Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileView>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  Ok(Json(load(state.store.as_ref(), user_id).await?))
}

/// `GET /profiles/me`
pub async fn get_me<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileView>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  Ok(Json(load(state.store.as_ref(), user.user_id).await?))
}

/// `PUT /profiles/me`
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  update.validate()?;
  let profile = state
    .store
    .update_profile(user.user_id, update)
    .await
    .map_err(CoreError::store)?
    .ok_or(CoreError::UserNotFound(user.user_id))?;
  Ok(Json(profile))
}
