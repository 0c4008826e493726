//! [`SqliteStore`] — the SQLite implementation of [`BuddyStore`].

use std::path::Path;

use amiga_core::{
  assignment::{Assignment, Pairing, Vote},
  rating::{NewRating, Rating},
  store::BuddyStore,
  user::{Credentials, NewUser, Profile, ProfileUpdate, ProfileView, User},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawProfile, RawRating, RawUser, RawVote, encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Amiga store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Remove a user; their profile, assignments, votes, and ratings cascade.
  pub async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(deleted > 0)
  }
}

// ─── BuddyStore impl ─────────────────────────────────────────────────────────

impl BuddyStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      is_staff:   input.is_staff,
      created_at: now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let at_str   = encode_dt(user.created_at);
    let username = user.username.clone();
    let is_staff = user.is_staff;
    let hash     = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match tx.execute(
          "INSERT INTO users (user_id, username, password_hash, is_staff, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, hash, is_staff, at_str],
        ) {
          Ok(_) => {}
          Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            return Ok(false);
          }
          Err(e) => return Err(e.into()),
        }
        tx.execute(
          "INSERT INTO profiles (user_id, date_joined) VALUES (?1, ?2)",
          rusqlite::params![id_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Core(amiga_core::Error::Conflict(format!(
        "username {:?} is already taken",
        user.username
      ))));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_credentials(&self, username: &str) -> Result<Option<Credentials>> {
    let username = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", RawUser::COLUMNS),
            rusqlite::params![username],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_credentials).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM users ORDER BY created_at, username",
          RawUser::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn count_users(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
      .await?;
    Ok(count as usize)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileView>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<(String, RawProfile, i64, Option<f64>)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT u.username, p.user_id, p.bio, p.is_bestie, p.date_joined,
                    (SELECT COUNT(*)   FROM ratings r WHERE r.rated_user_id = p.user_id),
                    (SELECT AVG(score) FROM ratings r WHERE r.rated_user_id = p.user_id)
             FROM profiles p
             JOIN users u ON u.user_id = p.user_id
             WHERE p.user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok((
                row.get(0)?,
                RawProfile {
                  user_id:     row.get(1)?,
                  bio:         row.get(2)?,
                  is_bestie:   row.get(3)?,
                  date_joined: row.get(4)?,
                },
                row.get(5)?,
                row.get(6)?,
              ))
            },
          )
          .optional()?)
      })
      .await?;

    let Some((username, profile, total, mean)) = raw else {
      return Ok(None);
    };
    Ok(Some(ProfileView::from_aggregate(
      username,
      profile.into_profile()?,
      total as u64,
      mean,
    )))
  }

  async fn update_profile(
    &self,
    user_id: Uuid,
    update:  ProfileUpdate,
  ) -> Result<Option<Profile>> {
    update.validate()?;
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE profiles
           SET bio       = COALESCE(?2, bio),
               is_bestie = COALESCE(?3, is_bestie)
           WHERE user_id = ?1",
          rusqlite::params![id_str, update.bio, update.is_bestie],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          "SELECT user_id, bio, is_bestie, date_joined FROM profiles WHERE user_id = ?1",
          rusqlite::params![id_str],
          |row| {
            Ok(RawProfile {
              user_id:     row.get(0)?,
              bio:         row.get(1)?,
              is_bestie:   row.get(2)?,
              date_joined: row.get(3)?,
            })
          },
        )?))
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  // ── Rotation ──────────────────────────────────────────────────────────────

  async fn list_assignments(&self, interval_start: DateTime<Utc>) -> Result<Vec<Assignment>> {
    let at_str = encode_dt(interval_start);

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT assignment_id, assigner_id, assignee_id, interval_start, is_active
           FROM assignments
           WHERE interval_start = ?1 AND is_active = 1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![at_str], RawAssignment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  async fn list_votes(&self, interval_start: DateTime<Utc>) -> Result<Vec<Vote>> {
    let at_str = encode_dt(interval_start);

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT vote_id, voter_id, recipient_id, assignment_id, interval_start, created_at
           FROM votes
           WHERE interval_start = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![at_str], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn replace_assignments(
    &self,
    interval_start: DateTime<Utc>,
    pairings:       Vec<Pairing>,
  ) -> Result<(Vec<Assignment>, Vec<Vote>)> {
    let created_at = now();
    let (assignments, votes): (Vec<Assignment>, Vec<Vote>) = pairings
      .into_iter()
      .map(|p| {
        let assignment = Assignment {
          assignment_id: Uuid::new_v4(),
          assigner_id:   p.assigner,
          assignee_id:   p.assignee,
          interval_start,
          is_active:     true,
        };
        let vote = Vote {
          vote_id:       Uuid::new_v4(),
          voter_id:      p.assigner,
          recipient_id:  p.assignee,
          assignment_id: assignment.assignment_id,
          interval_start,
          created_at,
        };
        (assignment, vote)
      })
      .unzip();

    let interval_str = encode_dt(interval_start);
    let created_str  = encode_dt(created_at);
    let rows: Vec<(String, String, String, String)> = assignments
      .iter()
      .zip(&votes)
      .map(|(a, v)| {
        (
          encode_uuid(a.assignment_id),
          encode_uuid(a.assigner_id),
          encode_uuid(a.assignee_id),
          encode_uuid(v.vote_id),
        )
      })
      .collect();

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Votes first; they reference assignments.
        tx.execute(
          "DELETE FROM votes WHERE interval_start = ?1",
          rusqlite::params![interval_str],
        )?;
        let removed = tx.execute(
          "DELETE FROM assignments WHERE interval_start = ?1",
          rusqlite::params![interval_str],
        )?;
        {
          let mut insert_assignment = tx.prepare(
            "INSERT INTO assignments
               (assignment_id, assigner_id, assignee_id, interval_start, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
          )?;
          let mut insert_vote = tx.prepare(
            "INSERT INTO votes
               (vote_id, voter_id, recipient_id, assignment_id, interval_start, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (assignment_id, assigner_id, assignee_id, vote_id) in &rows {
            insert_assignment.execute(rusqlite::params![
              assignment_id,
              assigner_id,
              assignee_id,
              interval_str,
            ])?;
            insert_vote.execute(rusqlite::params![
              vote_id,
              assigner_id,
              assignee_id,
              assignment_id,
              interval_str,
              created_str,
            ])?;
          }
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    tracing::debug!(
      interval_start = %interval_start,
      removed,
      inserted = assignments.len(),
      "replaced interval assignments"
    );
    Ok((assignments, votes))
  }

  // ── Votes & ratings ───────────────────────────────────────────────────────

  async fn get_vote(&self, id: Uuid) -> Result<Option<Vote>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT vote_id, voter_id, recipient_id, assignment_id, interval_start, created_at
             FROM votes WHERE vote_id = ?1",
            rusqlite::params![id_str],
            RawVote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn next_unrated_vote(
    &self,
    user_id:        Uuid,
    interval_start: DateTime<Utc>,
  ) -> Result<Option<Vote>> {
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(interval_start);

    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT v.vote_id, v.voter_id, v.recipient_id, v.assignment_id,
                    v.interval_start, v.created_at
             FROM votes v
             WHERE v.recipient_id = ?1
               AND v.interval_start < ?2
               AND NOT EXISTS (
                 SELECT 1 FROM ratings r
                 WHERE r.vote_id = v.vote_id AND r.rater_id = ?1
               )
             ORDER BY v.interval_start DESC, v.created_at DESC
             LIMIT 1",
            rusqlite::params![user_str, at_str],
            RawVote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn upsert_rating(&self, input: NewRating) -> Result<Rating> {
    let rating_id_str = encode_uuid(Uuid::new_v4());
    let rater_str     = encode_uuid(input.rater_id);
    let rated_str     = encode_uuid(input.rated_user_id);
    let vote_str      = encode_uuid(input.vote_id);
    let score         = i64::from(input.score.get());
    let at_str        = encode_dt(now());

    let raw: RawRating = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO ratings (rating_id, rater_id, rated_user_id, vote_id, score, rated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (rater_id, vote_id) DO UPDATE SET score = excluded.score
           RETURNING rating_id, rater_id, rated_user_id, vote_id, score, rated_at",
          rusqlite::params![rating_id_str, rater_str, rated_str, vote_str, score, at_str],
          RawRating::from_row,
        )?)
      })
      .await?;

    raw.into_rating()
  }

  async fn list_ratings_by(&self, rater_id: Uuid) -> Result<Vec<Rating>> {
    let rater_str = encode_uuid(rater_id);

    let raws: Vec<RawRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT rating_id, rater_id, rated_user_id, vote_id, score, rated_at
           FROM ratings
           WHERE rater_id = ?1
           ORDER BY rated_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![rater_str], RawRating::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_rating).collect()
  }
}
