//! The `BuddyStore` trait.
//!
//! Implemented by storage backends (e.g. `amiga-store-sqlite`). The rotator,
//! rating submission, and read models depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  assignment::{Assignment, Pairing, Vote},
  rating::{NewRating, Rating},
  user::{Credentials, NewUser, Profile, ProfileUpdate, ProfileView, User},
};

/// Abstraction over an Amiga storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BuddyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user and their default profile in one transaction.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by username.
  fn get_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// All users, oldest first.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn count_users(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// The user's profile with its rating aggregate. `None` if the user does
  /// not exist.
  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<ProfileView>, Self::Error>> + Send + '_;

  /// Apply `update` to the user's profile. `None` if the user does not exist.
  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  // ── Rotation ──────────────────────────────────────────────────────────

  /// Active assignments for the interval starting at `interval_start`.
  fn list_assignments(
    &self,
    interval_start: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  fn list_votes(
    &self,
    interval_start: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  /// Atomically replace every assignment and vote of the interval with one
  /// active assignment plus one mirrored vote per pairing.
  ///
  /// Either the whole replacement commits or nothing changes.
  fn replace_assignments(
    &self,
    interval_start: DateTime<Utc>,
    pairings: Vec<Pairing>,
  ) -> impl Future<Output = Result<(Vec<Assignment>, Vec<Vote>), Self::Error>>
  + Send
  + '_;

  // ── Votes & ratings ───────────────────────────────────────────────────

  fn get_vote(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// The most recent vote received by `user_id` in an interval strictly
  /// before `interval_start` that `user_id` has not rated yet.
  fn next_unrated_vote(
    &self,
    user_id: Uuid,
    interval_start: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// Insert a rating, or overwrite the score of the existing rating for the
  /// same `(rater_id, vote_id)`.
  fn upsert_rating(
    &self,
    input: NewRating,
  ) -> impl Future<Output = Result<Rating, Self::Error>> + Send + '_;

  /// Every rating authored by `rater_id`, newest first.
  fn list_ratings_by(
    &self,
    rater_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rating>, Self::Error>> + Send + '_;
}
