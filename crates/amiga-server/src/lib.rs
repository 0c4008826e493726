//! HTTP layer for Amiga.
//!
//! Exposes an axum [`Router`] serving the weekly buddy rotation as JSON,
//! backed by any [`BuddyStore`]. Every route except registration requires
//! HTTP Basic credentials.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

pub use config::ServerConfig;
pub use error::Error;

use std::sync::Arc;

use amiga_core::store::BuddyStore;
use axum::{
  Router,
  routing::{get, post},
};
use tower_http::trace::TraceLayer;

use handlers::{accounts, assignments, profiles, votes};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BuddyStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Amiga server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BuddyStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/accounts/register",   post(accounts::register::<S>))
    .route("/votes",               get(votes::overview::<S>))
    .route("/votes/assignments",   get(votes::roster::<S>))
    .route("/votes/ratings",       post(votes::rate::<S>))
    .route("/assignments/refresh", post(assignments::refresh::<S>))
    .route("/profiles/me",         get(profiles::get_me::<S>).put(profiles::update_me::<S>))
    .route("/profiles/{user_id}",  get(profiles::get_one::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  use amiga_core::{
    assignment::Vote,
    interval::{self, AnchorPolicy},
    user::NewUser,
  };
  use amiga_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use chrono::Utc;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::auth::hash_password;

  const PASSWORD: &str = "correct-horse";

  async fn make_state() -> AppState<SqliteStore> {
    AppState {
      store:  Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      config: Arc::new(ServerConfig {
        host:       "127.0.0.1".to_string(),
        port:       8000,
        store_path: PathBuf::from(":memory:"),
        anchor:     AnchorPolicy::MondayMidnight,
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    auth:   Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = auth {
      builder = builder.header(header::AUTHORIZATION, auth_header(user, PASSWORD));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn register(state: &AppState<SqliteStore>, username: &str) -> Value {
    let res = send(
      state,
      "POST",
      "/accounts/register",
      None,
      Some(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    json_body(res).await
  }

  async fn add_staff(state: &AppState<SqliteStore>, username: &str) {
    state
      .store
      .add_user(NewUser {
        username:      username.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
        is_staff:      true,
      })
      .await
      .unwrap();
  }

  async fn current_votes(state: &AppState<SqliteStore>) -> Vec<Vote> {
    let start = interval::current_interval_start(AnchorPolicy::MondayMidnight, Utc::now());
    state.store.list_votes(start).await.unwrap()
  }

  // ── Accounts ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_registration_has_too_few_users() {
    let state = make_state().await;
    let body = register(&state, "alice").await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["is_staff"], false);
    assert_eq!(body["rotation"]["status"], "insufficient_users");
  }

  #[tokio::test]
  async fn second_registration_builds_rotation() {
    let state = make_state().await;
    register(&state, "alice").await;
    let body = register(&state, "bob").await;
    assert_eq!(body["rotation"]["status"], "recreated");
    assert_eq!(body["rotation"]["assignment_count"], 2);
  }

  #[tokio::test]
  async fn duplicate_username_is_conflict() {
    let state = make_state().await;
    register(&state, "alice").await;
    let res = send(
      &state,
      "POST",
      "/accounts/register",
      None,
      Some(json!({ "username": "alice", "password": PASSWORD })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(json_body(res).await["error"].is_string());
  }

  #[tokio::test]
  async fn short_password_is_rejected() {
    let state = make_state().await;
    let res = send(
      &state,
      "POST",
      "/accounts/register",
      None,
      Some(json!({ "username": "alice", "password": "short" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  // ── Auth ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_get_challenge() {
    let state = make_state().await;
    let res = send(&state, "GET", "/votes", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      res.headers().get(header::WWW_AUTHENTICATE).unwrap(),
      "Basic realm=\"amiga\""
    );
  }

  // ── Votes ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn overview_shows_own_assignment() {
    let state = make_state().await;
    register(&state, "alice").await;
    register(&state, "bob").await;

    let res = send(&state, "GET", "/votes", Some("alice"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["rotation"]["status"], "unchanged");
    assert_eq!(body["roster"].as_array().unwrap().len(), 2);
    assert_eq!(body["own_assignment"]["assigner"]["username"], "alice");
    assert_eq!(body["own_assignment"]["assignee"]["username"], "bob");
    assert!(body["unrated_vote"].is_null());
  }

  #[tokio::test]
  async fn roster_is_sorted_by_assigner() {
    let state = make_state().await;
    for name in ["carol", "alice", "bob"] {
      register(&state, name).await;
    }
    let res = send(&state, "GET", "/votes/assignments", Some("bob"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let assigners: Vec<&str> = body["assignments"]
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["assigner"]["username"].as_str().unwrap())
      .collect();
    assert_eq!(assigners, ["alice", "bob", "carol"]);
  }

  #[tokio::test]
  async fn recipient_can_rate_and_rerate() {
    let state = make_state().await;
    register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let bob_id: Uuid = serde_json::from_value(bob["user"]["user_id"].clone()).unwrap();

    let vote = current_votes(&state)
      .await
      .into_iter()
      .find(|v| v.recipient_id == bob_id)
      .unwrap();

    for score in [2, 5] {
      let res = send(
        &state,
        "POST",
        "/votes/ratings",
        Some("bob"),
        Some(json!({ "vote_id": vote.vote_id, "score": score })),
      )
      .await;
      assert_eq!(res.status(), StatusCode::OK);
      let body = json_body(res).await;
      assert_eq!(body["success"], true);
      assert_eq!(body["rating"]["score"], score);
    }

    let res = send(&state, "GET", &format!("/profiles/{}", vote.voter_id), Some("bob"), None).await;
    let body = json_body(res).await;
    assert_eq!(body["total_ratings"], 1);
    assert_eq!(body["average_rating"], 5.0);
  }

  #[tokio::test]
  async fn rating_outlives_rotation_rebuild() {
    let state = make_state().await;
    register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let bob_id: Uuid = serde_json::from_value(bob["user"]["user_id"].clone()).unwrap();
    let vote = current_votes(&state)
      .await
      .into_iter()
      .find(|v| v.recipient_id == bob_id)
      .unwrap();

    let res = send(
      &state,
      "POST",
      "/votes/ratings",
      Some("bob"),
      Some(json!({ "vote_id": vote.vote_id, "score": 4 })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // A third registration rebuilds the current interval.
    let body = register(&state, "carol").await;
    assert_eq!(body["rotation"]["status"], "recreated");

    let res = send(&state, "GET", &format!("/profiles/{}", vote.voter_id), Some("bob"), None).await;
    let body = json_body(res).await;
    assert_eq!(body["total_ratings"], 1);
    assert_eq!(body["average_rating"], 4.0);
  }

  #[tokio::test]
  async fn rating_someone_elses_vote_is_forbidden() {
    let state = make_state().await;
    register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let bob_id: Uuid = serde_json::from_value(bob["user"]["user_id"].clone()).unwrap();
    let vote = current_votes(&state)
      .await
      .into_iter()
      .find(|v| v.recipient_id == bob_id)
      .unwrap();

    let res = send(
      &state,
      "POST",
      "/votes/ratings",
      Some("alice"),
      Some(json!({ "vote_id": vote.vote_id, "score": 4 })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn out_of_range_score_is_bad_request() {
    let state = make_state().await;
    register(&state, "alice").await;
    register(&state, "bob").await;
    let vote = current_votes(&state).await.remove(0);
    let recipient = state.store.get_user(vote.recipient_id).await.unwrap().unwrap();

    let res = send(
      &state,
      "POST",
      "/votes/ratings",
      Some(&recipient.username),
      Some(json!({ "vote_id": vote.vote_id, "score": 6 })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_vote_is_not_found() {
    let state = make_state().await;
    register(&state, "alice").await;
    let res = send(
      &state,
      "POST",
      "/votes/ratings",
      Some("alice"),
      Some(json!({ "vote_id": Uuid::new_v4(), "score": 3 })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }

  // ── Assignments ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn refresh_requires_staff() {
    let state = make_state().await;
    register(&state, "alice").await;
    register(&state, "bob").await;
    let res = send(&state, "POST", "/assignments/refresh", Some("alice"), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn staff_refresh_replaces_assignments() {
    let state = make_state().await;
    register(&state, "alice").await;
    register(&state, "bob").await;
    add_staff(&state, "root").await;
    let before: Vec<Uuid> = current_votes(&state).await.iter().map(|v| v.vote_id).collect();

    let res = send(&state, "POST", "/assignments/refresh", Some("root"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["rotation"]["status"], "recreated");
    assert_eq!(body["rotation"]["assignment_count"], 3);
    assert_eq!(body["message"], "Created 3 new assignments.");

    let after = current_votes(&state).await;
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|v| !before.contains(&v.vote_id)));
  }

  // ── Profiles ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_defaults_and_update() {
    let state = make_state().await;
    register(&state, "alice").await;

    let res = send(&state, "GET", "/profiles/me", Some("alice"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["profile"]["is_bestie"], true);
    assert_eq!(body["profile"]["bio"], "");
    assert_eq!(body["average_rating"], 0.0);

    let res = send(
      &state,
      "PUT",
      "/profiles/me",
      Some("alice"),
      Some(json!({ "bio": "hi there", "is_bestie": false })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["bio"], "hi there");
    assert_eq!(body["is_bestie"], false);
  }

  #[tokio::test]
  async fn overlong_bio_is_rejected() {
    let state = make_state().await;
    register(&state, "alice").await;
    let res = send(
      &state,
      "PUT",
      "/profiles/me",
      Some("alice"),
      Some(json!({ "bio": "x".repeat(201) })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn missing_profile_is_not_found() {
    let state = make_state().await;
    register(&state, "alice").await;
    let uri = format!("/profiles/{}", Uuid::new_v4());
    let res = send(&state, "GET", &uri, Some("alice"), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
  }
}
