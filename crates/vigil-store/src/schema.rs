//! SQL schema for the watchlist store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    photo_path  TEXT,
    created_at  TEXT NOT NULL    -- ISO 8601 UTC
);

-- One row per enrolled reference image; an identity keeps at least one
-- while active (enforced by the management layer, not the schema).
CREATE TABLE IF NOT EXISTS identity_encodings (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id  INTEGER NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    encoding     BLOB NOT NULL,   -- little-endian f32 array
    source_photo TEXT
);

-- Alert records are written once and never updated; they disappear only
-- when their identity is deleted.
CREATE TABLE IF NOT EXISTS alerts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    identity_id     INTEGER NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    terminal_id     TEXT NOT NULL,
    observed_at     TEXT NOT NULL,  -- ISO 8601 UTC
    evidence_path   TEXT,           -- NULL when the evidence write failed
    reference_photo TEXT
);

CREATE INDEX IF NOT EXISTS encodings_identity_idx ON identity_encodings(identity_id);
CREATE INDEX IF NOT EXISTS alerts_identity_idx    ON alerts(identity_id);
CREATE INDEX IF NOT EXISTS alerts_observed_idx    ON alerts(observed_at);

PRAGMA user_version = 1;
";
