//! SQL schema for the Santuario SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Daily content. Replaced wholesale on import; `position` preserves the
-- collection order the seeded selector indexes into.
CREATE TABLE IF NOT EXISTS content_items (
    collection  TEXT    NOT NULL,  -- 'readings' | 'philosophers' | ...
    position    INTEGER NOT NULL,
    value_json  TEXT    NOT NULL,
    PRIMARY KEY (collection, position)
);

CREATE TABLE IF NOT EXISTS user_settings (
    user_id     TEXT PRIMARY KEY,
    daily_salt  TEXT
);

-- One row per user per calendar date; upserted on every save.
CREATE TABLE IF NOT EXISTS journal_entries (
    user_id             TEXT    NOT NULL,
    date                TEXT    NOT NULL,  -- YYYY-MM-DD
    text                TEXT    NOT NULL DEFAULT '',
    mood                INTEGER NOT NULL DEFAULT 0 CHECK (mood BETWEEN 0 AND 5),
    question_response   TEXT,
    challenge_response  TEXT,
    challenge_title     TEXT,
    challenge_status    TEXT,              -- 'success' | 'failed' | NULL
    challenge_completed INTEGER NOT NULL DEFAULT 0,
    updated_at          TEXT    NOT NULL,  -- ISO 8601 UTC; store-assigned
    PRIMARY KEY (user_id, date)
);

-- Append-only XP ledger; one award per interaction per day.
CREATE TABLE IF NOT EXISTS xp_awards (
    award_id     TEXT PRIMARY KEY,
    user_id      TEXT    NOT NULL,
    date         TEXT    NOT NULL,
    interaction  TEXT    NOT NULL,
    xp           INTEGER NOT NULL,
    recorded_at  TEXT    NOT NULL,
    UNIQUE (user_id, date, interaction)
);

CREATE INDEX IF NOT EXISTS xp_awards_user_idx ON xp_awards(user_id);

PRAGMA user_version = 1;
";
