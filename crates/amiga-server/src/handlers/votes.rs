//! Handlers for `/votes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/votes` | Overview; repairs the current rotation first |
//! | `GET`  | `/votes/assignments` | Roster as stored, plus countdown |
//! | `POST` | `/votes/ratings` | Body: `{"vote_id":"...","score":1..5}` |

use amiga_core::{
  overview::{AssignmentRoster, IntervalOverview, assignment_roster, interval_overview},
  rating::{Rating, submit_rating},
  store::BuddyStore,
};
use axum::{Json, extract::State};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::Error};

/// `GET /votes`
pub async fn overview<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<IntervalOverview>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  let mut rng = StdRng::from_entropy();
  let overview = interval_overview(
    state.store.as_ref(),
    state.config.anchor,
    &user,
    Utc::now(),
    &mut rng,
  )
  .await?;
  Ok(Json(overview))
}

/// `GET /votes/assignments`
pub async fn roster<S>(
  State(state): State<AppState<S>>,
  CurrentUser(_): CurrentUser,
) -> Result<Json<AssignmentRoster>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  let roster = assignment_roster(state.store.as_ref(), state.config.anchor, Utc::now()).await?;
  Ok(Json(roster))
}

#[derive(Debug, Deserialize)]
pub struct RateBody {
  pub vote_id: Uuid,
  pub score:   i64,
}

#[derive(Debug, Serialize)]
pub struct Rated {
  pub success: bool,
  pub message: &'static str,
  pub rating:  Rating,
}

/// `POST /votes/ratings`
pub async fn rate<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<RateBody>,
) -> Result<Json<Rated>, Error>
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  let rating = submit_rating(state.store.as_ref(), user.user_id, body.vote_id, body.score).await?;
  Ok(Json(Rated { success: true, message: "Rating submitted!", rating }))
}
