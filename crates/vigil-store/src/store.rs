//! [`WatchlistStore`] — the SQLite store for the roster and alert log.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use serde::Serialize;
use vigil_core::{Encoding, GalleryEntry};

use crate::{
    encode::{decode_dt, encode_dt, encoding_from_blob, encoding_to_blob},
    schema::SCHEMA,
    Error, Result,
};

/// A flagged identity as stored in the roster.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Roster listing row for operator tooling.
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub encodings: i64,
}

/// Input for one alert insert. `evidence_path` is `None` when the
/// evidence image could not be written; the record is still created.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub identity_id: i64,
    pub terminal_id: String,
    pub observed_at: DateTime<Utc>,
    pub evidence_path: Option<String>,
    pub reference_photo: Option<String>,
}

/// A persisted alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub id: i64,
    pub identity_id: i64,
    pub terminal_id: String,
    pub observed_at: DateTime<Utc>,
    pub evidence_path: Option<String>,
    pub reference_photo: Option<String>,
}

/// Alert joined with its identity's display name, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub id: i64,
    pub identity_id: i64,
    pub name: String,
    pub terminal_id: String,
    pub observed_at: DateTime<Utc>,
    pub evidence_path: Option<String>,
}

/// Raw row shapes used inside `call` closures, decoded afterwards.
struct RawAlertView {
    id: i64,
    identity_id: i64,
    name: String,
    terminal_id: String,
    observed_at: String,
    evidence_path: Option<String>,
}

struct RawGalleryRow {
    row_id: i64,
    identity_id: i64,
    name: String,
    blob: Vec<u8>,
    source_photo: Option<String>,
}

/// The watchlist store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct WatchlistStore {
    conn: tokio_rusqlite::Connection,
}

impl WatchlistStore {
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
        self.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // ── Roster ───────────────────────────────────────────────────────────

    /// Add an identity to the roster. Reference encodings are enrolled
    /// separately via [`add_encoding`](Self::add_encoding).
    pub async fn add_identity(
        &self,
        name: &str,
        description: Option<String>,
        photo_path: Option<String>,
    ) -> Result<IdentityRecord> {
        let created_at = Utc::now();
        let name_owned = name.to_owned();
        let at_str = encode_dt(created_at);
        let desc = description.clone();
        let photo = photo_path.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO identities (name, description, photo_path, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![name_owned, desc, photo, at_str],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(IdentityRecord {
            id,
            name: name.to_owned(),
            description,
            photo_path,
            created_at,
        })
    }

    /// Enroll one reference encoding for an identity. Returns the
    /// encoding row id, which is also its position in gallery load order.
    pub async fn add_encoding(
        &self,
        identity_id: i64,
        encoding: &Encoding,
        source_photo: Option<String>,
    ) -> Result<i64> {
        let blob = encoding_to_blob(encoding);

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO identity_encodings (identity_id, encoding, source_photo)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![identity_id, blob, source_photo],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(id)
    }

    /// Remove an identity; its encodings and alerts cascade away.
    pub async fn remove_identity(&self, identity_id: i64) -> Result<()> {
        let removed = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM identities WHERE id = ?1",
                    rusqlite::params![identity_id],
                )?;
                Ok(n)
            })
            .await?;

        if removed == 0 {
            return Err(Error::IdentityNotFound(identity_id));
        }
        Ok(())
    }

    /// Roster listing with per-identity encoding counts.
    pub async fn roster(&self) -> Result<Vec<IdentitySummary>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT i.id, i.name, i.description, COUNT(e.id)
                     FROM identities i
                     LEFT JOIN identity_encodings e ON e.identity_id = i.id
                     GROUP BY i.id
                     ORDER BY i.name",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(IdentitySummary {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            encodings: row.get(3)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows)
    }

    // ── Gallery ──────────────────────────────────────────────────────────

    /// Load every (identity, reference encoding) pair in enrollment
    /// order. Rows whose blob fails to decode are skipped with a warning
    /// rather than failing the whole load.
    pub async fn load_gallery(&self) -> Result<Vec<GalleryEntry>> {
        let raws: Vec<RawGalleryRow> = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT e.id, e.identity_id, i.name, e.encoding, e.source_photo
                     FROM identity_encodings e
                     JOIN identities i ON i.id = e.identity_id
                     ORDER BY e.id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(RawGalleryRow {
                            row_id: row.get(0)?,
                            identity_id: row.get(1)?,
                            name: row.get(2)?,
                            blob: row.get(3)?,
                            source_photo: row.get(4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        let mut entries = Vec::with_capacity(raws.len());
        for raw in raws {
            match encoding_from_blob(&raw.blob) {
                Ok(encoding) => entries.push(GalleryEntry {
                    identity_id: raw.identity_id,
                    name: raw.name,
                    encoding,
                    source_photo: raw.source_photo,
                }),
                Err(err) => {
                    tracing::warn!(
                        row_id = raw.row_id,
                        name = %raw.name,
                        error = %err,
                        "skipping unreadable reference encoding"
                    );
                }
            }
        }

        Ok(entries)
    }

    // ── Alerts ───────────────────────────────────────────────────────────

    /// Insert one alert record. Alerts are never updated after creation.
    pub async fn insert_alert(&self, alert: NewAlert) -> Result<AlertRecord> {
        let at_str = encode_dt(alert.observed_at);
        let input = alert.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO alerts
                       (identity_id, terminal_id, observed_at, evidence_path, reference_photo)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        input.identity_id,
                        input.terminal_id,
                        at_str,
                        input.evidence_path,
                        input.reference_photo,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(AlertRecord {
            id,
            identity_id: alert.identity_id,
            terminal_id: alert.terminal_id,
            observed_at: alert.observed_at,
            evidence_path: alert.evidence_path,
            reference_photo: alert.reference_photo,
        })
    }

    /// Most recent alerts first, joined with identity names.
    pub async fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertView>> {
        let limit = limit as i64;

        let raws: Vec<RawAlertView> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT a.id, a.identity_id, i.name, a.terminal_id,
                            a.observed_at, a.evidence_path
                     FROM alerts a
                     JOIN identities i ON i.id = a.identity_id
                     ORDER BY a.observed_at DESC, a.id DESC
                     LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![limit], |row| {
                        Ok(RawAlertView {
                            id: row.get(0)?,
                            identity_id: row.get(1)?,
                            name: row.get(2)?,
                            terminal_id: row.get(3)?,
                            observed_at: row.get(4)?,
                            evidence_path: row.get(5)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        raws.into_iter()
            .map(|raw| {
                Ok(AlertView {
                    id: raw.id,
                    identity_id: raw.identity_id,
                    name: raw.name,
                    terminal_id: raw.terminal_id,
                    observed_at: decode_dt(&raw.observed_at)?,
                    evidence_path: raw.evidence_path,
                })
            })
            .collect()
    }

    /// Number of alerts on record for one identity.
    pub async fn alert_count(&self, identity_id: i64) -> Result<i64> {
        let count = self
            .conn
            .call(move |conn| {
                let n: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM alerts WHERE identity_id = ?1",
                        rusqlite::params![identity_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .unwrap_or(0);
                Ok(n)
            })
            .await?;
        Ok(count)
    }
}
