//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that string comparison in SQL matches
//! chronological order. UUIDs are stored as hyphenated lowercase strings.

use amiga_core::{
  assignment::{Assignment, Vote},
  rating::{Rating, Score},
  user::{Credentials, Profile, User},
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time at the precision the store keeps, so values handed back
/// to callers compare equal to what a later read returns.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns of a `users` row (optionally with the password hash).
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub is_staff:      bool,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, username, is_staff, created_at, password_hash";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      is_staff:      row.get(2)?,
      created_at:    row.get(3)?,
      password_hash: row.get(4)?,
    })
  }

  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          User {
        user_id:    decode_uuid(&self.user_id)?,
        username:   self.username,
        is_staff:   self.is_staff,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.user) }
}

/// Raw columns of an `assignments` row.
pub struct RawAssignment {
  pub assignment_id:  String,
  pub assigner_id:    String,
  pub assignee_id:    String,
  pub interval_start: String,
  pub is_active:      bool,
}

impl RawAssignment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id:  row.get(0)?,
      assigner_id:    row.get(1)?,
      assignee_id:    row.get(2)?,
      interval_start: row.get(3)?,
      is_active:      row.get(4)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id:  decode_uuid(&self.assignment_id)?,
      assigner_id:    decode_uuid(&self.assigner_id)?,
      assignee_id:    decode_uuid(&self.assignee_id)?,
      interval_start: decode_dt(&self.interval_start)?,
      is_active:      self.is_active,
    })
  }
}

/// Raw columns of a `votes` row.
pub struct RawVote {
  pub vote_id:        String,
  pub voter_id:       String,
  pub recipient_id:   String,
  pub assignment_id:  String,
  pub interval_start: String,
  pub created_at:     String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:        row.get(0)?,
      voter_id:       row.get(1)?,
      recipient_id:   row.get(2)?,
      assignment_id:  row.get(3)?,
      interval_start: row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:        decode_uuid(&self.vote_id)?,
      voter_id:       decode_uuid(&self.voter_id)?,
      recipient_id:   decode_uuid(&self.recipient_id)?,
      assignment_id:  decode_uuid(&self.assignment_id)?,
      interval_start: decode_dt(&self.interval_start)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw columns of a `ratings` row.
pub struct RawRating {
  pub rating_id:     String,
  pub rater_id:      String,
  pub rated_user_id: String,
  pub vote_id:       Option<String>,
  pub score:         i64,
  pub rated_at:      String,
}

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:     row.get(0)?,
      rater_id:      row.get(1)?,
      rated_user_id: row.get(2)?,
      vote_id:       row.get(3)?,
      score:         row.get(4)?,
      rated_at:      row.get(5)?,
    })
  }

  pub fn into_rating(self) -> Result<Rating> {
    Ok(Rating {
      rating_id:     decode_uuid(&self.rating_id)?,
      rater_id:      decode_uuid(&self.rater_id)?,
      rated_user_id: decode_uuid(&self.rated_user_id)?,
      vote_id:       self.vote_id.as_deref().map(decode_uuid).transpose()?,
      score:         Score::try_from(self.score)?,
      rated_at:      decode_dt(&self.rated_at)?,
    })
  }
}

/// Raw columns of a `profiles` row.
pub struct RawProfile {
  pub user_id:     String,
  pub bio:         String,
  pub is_bestie:   bool,
  pub date_joined: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:     decode_uuid(&self.user_id)?,
      bio:         self.bio,
      is_bestie:   self.is_bestie,
      date_joined: decode_dt(&self.date_joined)?,
    })
  }
}
