//! SQL schema for the Amiga SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,      -- argon2 PHC string
    is_staff      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Exactly one row per user, inserted in the same transaction as the user.
CREATE TABLE IF NOT EXISTS profiles (
    user_id     TEXT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    bio         TEXT NOT NULL DEFAULT '',
    is_bestie   INTEGER NOT NULL DEFAULT 1,
    date_joined TEXT NOT NULL
);

-- Rebuilt wholesale per interval by the rotator.
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id  TEXT PRIMARY KEY,
    assigner_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    assignee_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    interval_start TEXT NOT NULL,     -- fixed-width RFC 3339 UTC
    is_active      INTEGER NOT NULL DEFAULT 1,
    UNIQUE (assigner_id, interval_start)
);

CREATE TABLE IF NOT EXISTS votes (
    vote_id        TEXT PRIMARY KEY,
    voter_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    recipient_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    assignment_id  TEXT NOT NULL UNIQUE
                   REFERENCES assignments(assignment_id) ON DELETE CASCADE,
    interval_start TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    UNIQUE (voter_id, interval_start)
);

-- A rebuilt interval detaches its ratings (vote_id becomes NULL) rather than
-- dropping them, so received-rating aggregates never shrink on a rebuild.
CREATE TABLE IF NOT EXISTS ratings (
    rating_id     TEXT PRIMARY KEY,
    rater_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    rated_user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    vote_id       TEXT REFERENCES votes(vote_id) ON DELETE SET NULL,
    score         INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    rated_at      TEXT NOT NULL,
    UNIQUE (rater_id, vote_id)
);

CREATE INDEX IF NOT EXISTS assignments_interval_idx ON assignments(interval_start);
CREATE INDEX IF NOT EXISTS votes_interval_idx       ON votes(interval_start);
CREATE INDEX IF NOT EXISTS votes_recipient_idx      ON votes(recipient_id, interval_start);
CREATE INDEX IF NOT EXISTS ratings_rated_user_idx   ON ratings(rated_user_id);

PRAGMA user_version = 1;
";
