//! The assignment rotator.
//!
//! Keeps exactly one circular assignment graph (plus one mirrored vote per
//! edge) in place for an interval. The graph is never patched: when the
//! stored state drifts from the current user set, or a caller forces it, the
//! whole interval is rebuilt from a fresh random permutation in a single
//! store transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::{Assignment, Vote},
  rotation::{is_single_cycle, shuffled_chain},
  store::BuddyStore,
  user::User,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a rotator call did.
#[derive(Debug, Clone)]
pub enum Rotation {
  /// Stored state already matched the user set; nothing was written.
  Unchanged {
    assignments: Vec<Assignment>,
    votes:       Vec<Vote>,
  },
  /// The interval was rebuilt.
  Recreated {
    assignments: Vec<Assignment>,
    votes:       Vec<Vote>,
  },
  /// Not enough users for a rotation. Informational, not an error.
  InsufficientUsers { user_count: usize },
}

impl Rotation {
  pub fn assignments(&self) -> &[Assignment] {
    match self {
      Self::Unchanged { assignments, .. } | Self::Recreated { assignments, .. } => assignments,
      Self::InsufficientUsers { .. } => &[],
    }
  }

  pub fn votes(&self) -> &[Vote] {
    match self {
      Self::Unchanged { votes, .. } | Self::Recreated { votes, .. } => votes,
      Self::InsufficientUsers { .. } => &[],
    }
  }

  /// A serialisable summary suitable for status messages.
  pub fn status(&self) -> RotationStatus {
    match self {
      Self::Unchanged { assignments, .. } => RotationStatus::Unchanged {
        assignment_count: assignments.len(),
      },
      Self::Recreated { assignments, .. } => RotationStatus::Recreated {
        assignment_count: assignments.len(),
      },
      Self::InsufficientUsers { user_count } => RotationStatus::InsufficientUsers {
        user_count: *user_count,
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RotationStatus {
  Unchanged { assignment_count: usize },
  Recreated { assignment_count: usize },
  InsufficientUsers { user_count: usize },
}

// ─── Drift ───────────────────────────────────────────────────────────────────

/// Why stored state for an interval no longer matches the user set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
  /// Users with no outgoing assignment.
  Unassigned(Vec<Uuid>),
  /// Row counts disagree with the user count.
  CountMismatch {
    users:       usize,
    assignments: usize,
    votes:       usize,
  },
}

/// Compare stored rows with the current users. `None` means consistent.
pub fn detect_drift(
  users: &[User],
  assignments: &[Assignment],
  votes: &[Vote],
) -> Option<Drift> {
  let assigned: HashSet<Uuid> = assignments.iter().map(|a| a.assigner_id).collect();
  let unassigned: Vec<Uuid> = users
    .iter()
    .map(|u| u.user_id)
    .filter(|id| !assigned.contains(id))
    .collect();

  if !unassigned.is_empty() {
    return Some(Drift::Unassigned(unassigned));
  }
  if assignments.len() != users.len() || votes.len() != assignments.len() {
    return Some(Drift::CountMismatch {
      users:       users.len(),
      assignments: assignments.len(),
      votes:       votes.len(),
    });
  }
  None
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Make sure the interval starting at `interval_start` has a complete
/// rotation, rebuilding it if the stored state has drifted.
///
/// Idempotent: when nothing has drifted the existing pairings are returned
/// untouched. With fewer than two users nothing is read or written.
pub async fn ensure_assignments<S, R>(
  store: &S,
  interval_start: DateTime<Utc>,
  rng: &mut R,
) -> Result<Rotation>
where
  S: BuddyStore,
  R: Rng + Send,
{
  let users = store.list_users().await.map_err(Error::store)?;
  if users.len() < 2 {
    tracing::debug!(user_count = users.len(), "not enough users to rotate");
    return Ok(Rotation::InsufficientUsers { user_count: users.len() });
  }

  let assignments = store
    .list_assignments(interval_start)
    .await
    .map_err(Error::store)?;
  let votes = store.list_votes(interval_start).await.map_err(Error::store)?;

  match detect_drift(&users, &assignments, &votes) {
    None => {
      tracing::debug!(%interval_start, count = assignments.len(), "rotation up to date");
      Ok(Rotation::Unchanged { assignments, votes })
    }
    Some(drift) => {
      tracing::info!(%interval_start, ?drift, "rotation drifted; recreating");
      recreate(store, interval_start, &users, rng).await
    }
  }
}

/// Rebuild the interval unconditionally (staff "refresh"). A lone user is
/// paired with themselves.
pub async fn recreate_assignments_forced<S, R>(
  store: &S,
  interval_start: DateTime<Utc>,
  rng: &mut R,
) -> Result<Rotation>
where
  S: BuddyStore,
  R: Rng + Send,
{
  let users = store.list_users().await.map_err(Error::store)?;
  if users.is_empty() {
    return Ok(Rotation::InsufficientUsers { user_count: 0 });
  }
  tracing::info!(%interval_start, users = users.len(), "forced rotation refresh");
  recreate(store, interval_start, &users, rng).await
}

/// Hook run after a new user has been provisioned.
///
/// Once there is more than one user the interval is rebuilt from scratch so
/// the newcomer joins the cycle; with one user or none it only reports
/// [`Rotation::InsufficientUsers`].
pub async fn on_user_registered<S, R>(
  store: &S,
  interval_start: DateTime<Utc>,
  rng: &mut R,
) -> Result<Rotation>
where
  S: BuddyStore,
  R: Rng + Send,
{
  let user_count = store.count_users().await.map_err(Error::store)?;
  if user_count <= 1 {
    tracing::info!(user_count, "not enough users to rotate yet");
    return Ok(Rotation::InsufficientUsers { user_count });
  }
  recreate_assignments_forced(store, interval_start, rng).await
}

async fn recreate<S, R>(
  store: &S,
  interval_start: DateTime<Utc>,
  users: &[User],
  rng: &mut R,
) -> Result<Rotation>
where
  S: BuddyStore,
  R: Rng + Send,
{
  let ids: Vec<Uuid> = users.iter().map(|u| u.user_id).collect();
  let pairings = shuffled_chain(&ids, rng);
  debug_assert!(is_single_cycle(&pairings));

  let (assignments, votes) = store
    .replace_assignments(interval_start, pairings)
    .await
    .map_err(Error::store)?;

  tracing::info!(%interval_start, count = assignments.len(), "rotation recreated");
  Ok(Rotation::Recreated { assignments, votes })
}
