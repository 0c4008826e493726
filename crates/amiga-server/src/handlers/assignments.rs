//! `POST /assignments/refresh` — staff-only forced rebuild of the current
//! interval's rotation.

use amiga_core::{
  interval,
  rotator::{Rotation, RotationStatus, recreate_assignments_forced},
  store::BuddyStore,
};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;

use crate::{AppState, auth::CurrentUser, error::Error};

#[derive(Debug, Serialize)]
pub struct Refreshed {
  pub interval_start: DateTime<Utc>,
  pub rotation:       RotationStatus,
  pub message:        String,
}

pub async fn refresh<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Refreshed>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  if !user.is_staff {
    return Err(Error::Forbidden("only staff can refresh assignments".into()));
  }

  let interval_start = interval::current_interval_start(state.config.anchor, Utc::now());
  let mut rng = StdRng::from_entropy();
  let rotation =
    recreate_assignments_forced(state.store.as_ref(), interval_start, &mut rng).await?;

  let message = match &rotation {
    Rotation::InsufficientUsers { .. } => "Not enough users to create assignments.".to_string(),
    other => format!("Created {} new assignments.", other.assignments().len()),
  };
  tracing::info!(by = %user.username, %interval_start, "assignments refreshed");

  Ok(Json(Refreshed { interval_start, rotation: rotation.status(), message }))
}
