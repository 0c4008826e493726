//! Ratings — feedback a recipient leaves on the buddy who voted for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::BuddyStore};

// ─── Score ───────────────────────────────────────────────────────────────────

/// An integer score in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Score {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::InvalidInput(format!(
        "score must be between {} and {}, got {value}",
        Self::MIN,
        Self::MAX
      )))
    }
  }
}

impl From<Score> for u8 {
  fn from(score: Score) -> Self { score.0 }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted rating. Unique per `(rater_id, vote_id)` while attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
  pub rating_id:     Uuid,
  pub rater_id:      Uuid,
  /// The voter being rated.
  pub rated_user_id: Uuid,
  /// `None` once the interval the vote belonged to has been rebuilt.
  pub vote_id:       Option<Uuid>,
  pub score:         Score,
  pub rated_at:      DateTime<Utc>,
}

/// Input to [`BuddyStore::upsert_rating`].
#[derive(Debug, Clone, Copy)]
pub struct NewRating {
  pub rater_id:      Uuid,
  pub rated_user_id: Uuid,
  pub vote_id:       Uuid,
  pub score:         Score,
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// Rate the voter behind `vote_id` on behalf of `rater`.
///
/// Only the vote's recipient may rate it. Submitting again for the same vote
/// overwrites the earlier score.
pub async fn submit_rating<S>(
  store: &S,
  rater: Uuid,
  vote_id: Uuid,
  score: i64,
) -> Result<Rating>
where
  S: BuddyStore,
{
  let score = Score::try_from(score)?;

  let vote = store
    .get_vote(vote_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::VoteNotFound(vote_id))?;

  if vote.recipient_id != rater {
    tracing::warn!(%rater, %vote_id, "rating rejected: vote addressed to someone else");
    return Err(Error::PermissionDenied(format!(
      "vote {vote_id} was not cast for this user"
    )));
  }

  let rating = store
    .upsert_rating(NewRating {
      rater_id: rater,
      rated_user_id: vote.voter_id,
      vote_id,
      score,
    })
    .await
    .map_err(Error::store)?;

  tracing::info!(%rater, %vote_id, score = score.get(), "rating recorded");
  Ok(rating)
}
