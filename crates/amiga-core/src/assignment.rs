//! Assignment and vote records — the per-interval rotation graph.
//!
//! An assignment is a directed edge `assigner → assignee` for one interval.
//! Every assignment is mirrored by exactly one vote; both are created and
//! deleted together by the rotator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One edge of the rotation, before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
  pub assigner: Uuid,
  pub assignee: Uuid,
}

impl Pairing {
  pub fn is_self_loop(&self) -> bool { self.assigner == self.assignee }
}

/// A persisted assignment: `assigner_id` secretly looks after `assignee_id`
/// for the interval starting at `interval_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:  Uuid,
  pub assigner_id:    Uuid,
  pub assignee_id:    Uuid,
  pub interval_start: DateTime<Utc>,
  pub is_active:      bool,
}

impl Assignment {
  pub fn pairing(&self) -> Pairing {
    Pairing { assigner: self.assigner_id, assignee: self.assignee_id }
  }
}

/// The implicit endorsement mirroring an [`Assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:        Uuid,
  /// Always the assignment's assigner.
  pub voter_id:       Uuid,
  /// Always the assignment's assignee.
  pub recipient_id:   Uuid,
  pub assignment_id:  Uuid,
  pub interval_start: DateTime<Utc>,
  pub created_at:     DateTime<Utc>,
}
