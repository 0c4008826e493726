//! Read models for the current interval.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::Assignment,
  interval::{self, AnchorPolicy, TimeRemaining},
  rotator::{self, RotationStatus},
  store::BuddyStore,
  user::User,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
  pub user_id:  Uuid,
  pub username: String,
}

impl From<&User> for UserSummary {
  fn from(u: &User) -> Self {
    Self { user_id: u.user_id, username: u.username.clone() }
  }
}

/// One resolved assignment edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
  pub assignment_id: Uuid,
  pub assigner:      UserSummary,
  pub assignee:      UserSummary,
}

/// A vote from an earlier interval still waiting for the viewer's rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRating {
  pub vote_id:        Uuid,
  pub voter:          UserSummary,
  pub interval_start: DateTime<Utc>,
}

/// Everything the home view shows a signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalOverview {
  pub interval_start:      DateTime<Utc>,
  pub next_interval_start: DateTime<Utc>,
  pub rotation:            RotationStatus,
  pub roster:              Vec<RosterEntry>,
  pub own_assignment:      Option<RosterEntry>,
  pub unrated_vote:        Option<PendingRating>,
  pub remaining:           TimeRemaining,
}

/// The roster alone, without touching stored state.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRoster {
  pub interval_start:      DateTime<Utc>,
  pub next_interval_start: DateTime<Utc>,
  pub assignments:         Vec<RosterEntry>,
  pub remaining:           TimeRemaining,
}

/// Build the viewer's overview, repairing the current rotation first.
pub async fn interval_overview<S, R>(
  store: &S,
  anchor: AnchorPolicy,
  viewer: &User,
  now: DateTime<Utc>,
  rng: &mut R,
) -> Result<IntervalOverview>
where
  S: BuddyStore,
  R: Rng + Send,
{
  let interval_start = interval::current_interval_start(anchor, now);
  let rotation = rotator::ensure_assignments(store, interval_start, rng).await?;

  let users = users_by_id(store).await?;
  let roster = resolve(rotation.assignments(), &users);
  let own_assignment = roster
    .iter()
    .find(|e| e.assigner.user_id == viewer.user_id)
    .cloned();

  let unrated_vote = store
    .next_unrated_vote(viewer.user_id, interval_start)
    .await
    .map_err(Error::store)?
    .and_then(|vote| {
      users.get(&vote.voter_id).map(|voter| PendingRating {
        vote_id:        vote.vote_id,
        voter:          voter.into(),
        interval_start: vote.interval_start,
      })
    });

  Ok(IntervalOverview {
    interval_start,
    next_interval_start: interval::next_interval_start(anchor, now),
    rotation: rotation.status(),
    roster,
    own_assignment,
    unrated_vote,
    remaining: interval::time_remaining(anchor, now),
  })
}

/// The current interval's roster as stored.
pub async fn assignment_roster<S>(
  store: &S,
  anchor: AnchorPolicy,
  now: DateTime<Utc>,
) -> Result<AssignmentRoster>
where
  S: BuddyStore,
{
  let interval_start = interval::current_interval_start(anchor, now);
  let assignments = store
    .list_assignments(interval_start)
    .await
    .map_err(Error::store)?;
  let users = users_by_id(store).await?;

  Ok(AssignmentRoster {
    interval_start,
    next_interval_start: interval::next_interval_start(anchor, now),
    assignments: resolve(&assignments, &users),
    remaining: interval::time_remaining(anchor, now),
  })
}

async fn users_by_id<S: BuddyStore>(store: &S) -> Result<HashMap<Uuid, User>> {
  Ok(
    store
      .list_users()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|u| (u.user_id, u))
      .collect(),
  )
}

fn resolve(assignments: &[Assignment], users: &HashMap<Uuid, User>) -> Vec<RosterEntry> {
  let mut roster: Vec<RosterEntry> = assignments
    .iter()
    .filter_map(|a| {
      let assigner = users.get(&a.assigner_id)?;
      let assignee = users.get(&a.assignee_id)?;
      Some(RosterEntry {
        assignment_id: a.assignment_id,
        assigner:      assigner.into(),
        assignee:      assignee.into(),
      })
    })
    .collect();
  roster.sort_by(|a, b| a.assigner.username.cmp(&b.assigner.username));
  roster
}
