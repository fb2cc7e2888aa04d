//! Integration tests for `WatchlistStore` against an in-memory database.

use chrono::{Duration, Utc};
use vigil_core::Encoding;

use crate::{Error, EvidenceStore, NewAlert, WatchlistStore};

async fn store() -> WatchlistStore {
    WatchlistStore::open_in_memory()
        .await
        .expect("in-memory store")
}

fn encoding(seed: f32) -> Encoding {
    Encoding::new((0..8).map(|i| seed + i as f32 * 0.01).collect())
}

fn alert_for(identity_id: i64, evidence: Option<&str>) -> NewAlert {
    NewAlert {
        identity_id,
        terminal_id: "TERM-TEST".into(),
        observed_at: Utc::now(),
        evidence_path: evidence.map(str::to_owned),
        reference_photo: None,
    }
}

// ── Roster ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_identity_and_list_roster() {
    let s = store().await;

    let jane = s
        .add_identity("Jane Doe", Some("flagged".into()), None)
        .await
        .unwrap();
    s.add_encoding(jane.id, &encoding(0.1), None).await.unwrap();
    s.add_encoding(jane.id, &encoding(0.2), None).await.unwrap();
    s.add_identity("Joe Bloggs", None, None).await.unwrap();

    let roster = s.roster().await.unwrap();
    assert_eq!(roster.len(), 2);

    let jane_row = roster.iter().find(|r| r.id == jane.id).unwrap();
    assert_eq!(jane_row.name, "Jane Doe");
    assert_eq!(jane_row.encodings, 2);

    let joe_row = roster.iter().find(|r| r.name == "Joe Bloggs").unwrap();
    assert_eq!(joe_row.encodings, 0);
}

#[tokio::test]
async fn remove_identity_missing_is_an_error() {
    let s = store().await;
    assert!(matches!(
        s.remove_identity(999).await,
        Err(Error::IdentityNotFound(999))
    ));
}

#[tokio::test]
async fn remove_identity_cascades_encodings_and_alerts() {
    let s = store().await;
    let id = s.add_identity("Jane", None, None).await.unwrap().id;
    s.add_encoding(id, &encoding(0.3), None).await.unwrap();
    s.insert_alert(alert_for(id, None)).await.unwrap();

    s.remove_identity(id).await.unwrap();

    assert!(s.load_gallery().await.unwrap().is_empty());
    assert_eq!(s.alert_count(id).await.unwrap(), 0);
    assert!(s.recent_alerts(10).await.unwrap().is_empty());
}

// ── Gallery ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn gallery_load_preserves_enrollment_order() {
    let s = store().await;
    let jane = s.add_identity("Jane", None, None).await.unwrap().id;
    let joe = s.add_identity("Joe", None, None).await.unwrap().id;

    // Interleave enrollments across identities.
    s.add_encoding(jane, &encoding(0.1), Some("jane_1.png".into()))
        .await
        .unwrap();
    s.add_encoding(joe, &encoding(0.2), None).await.unwrap();
    s.add_encoding(jane, &encoding(0.3), None).await.unwrap();

    let gallery = s.load_gallery().await.unwrap();
    let ids: Vec<i64> = gallery.iter().map(|e| e.identity_id).collect();
    assert_eq!(ids, vec![jane, joe, jane]);
    assert_eq!(gallery[0].name, "Jane");
    assert_eq!(gallery[0].encoding, encoding(0.1));
    assert_eq!(gallery[0].source_photo.as_deref(), Some("jane_1.png"));
    assert!(gallery[1].source_photo.is_none());
}

#[tokio::test]
async fn gallery_load_skips_corrupt_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vigil.db");

    let s = WatchlistStore::open(&db_path).await.unwrap();
    let id = s.add_identity("Jane", None, None).await.unwrap().id;
    s.add_encoding(id, &encoding(0.1), None).await.unwrap();

    // Corrupt a second row behind the store's back.
    let raw = rusqlite::Connection::open(&db_path).unwrap();
    raw.execute(
        "INSERT INTO identity_encodings (identity_id, encoding) VALUES (?1, ?2)",
        rusqlite::params![id, vec![1u8, 2, 3]],
    )
    .unwrap();
    drop(raw);

    let gallery = s.load_gallery().await.unwrap();
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery[0].encoding, encoding(0.1));
}

// ── Alerts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn alerts_list_reverse_chronological() {
    let s = store().await;
    let id = s.add_identity("Jane", None, None).await.unwrap().id;

    let base = Utc::now();
    for offset in [2i64, 0, 1] {
        let mut alert = alert_for(id, None);
        alert.observed_at = base + Duration::seconds(offset);
        s.insert_alert(alert).await.unwrap();
    }

    let alerts = s.recent_alerts(10).await.unwrap();
    assert_eq!(alerts.len(), 3);
    assert!(alerts[0].observed_at >= alerts[1].observed_at);
    assert!(alerts[1].observed_at >= alerts[2].observed_at);
    assert_eq!(alerts[0].name, "Jane");
}

#[tokio::test]
async fn alerts_list_honors_limit() {
    let s = store().await;
    let id = s.add_identity("Jane", None, None).await.unwrap().id;
    for _ in 0..5 {
        s.insert_alert(alert_for(id, None)).await.unwrap();
    }
    assert_eq!(s.recent_alerts(2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn alert_may_reference_no_evidence_image() {
    let s = store().await;
    let id = s.add_identity("Jane", None, None).await.unwrap().id;

    let record = s.insert_alert(alert_for(id, None)).await.unwrap();
    assert!(record.evidence_path.is_none());

    let record = s
        .insert_alert(alert_for(id, Some("/tmp/jane.png")))
        .await
        .unwrap();
    assert_eq!(record.evidence_path.as_deref(), Some("/tmp/jane.png"));
}

#[tokio::test]
async fn alert_for_unknown_identity_is_rejected() {
    let s = store().await;
    // Foreign keys are ON; the insert must fail rather than orphan a row.
    assert!(s.insert_alert(alert_for(12345, None)).await.is_err());
}

// ── Evidence files ───────────────────────────────────────────────────────

#[tokio::test]
async fn evidence_store_writes_bytes_under_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::new(dir.path().join("evidence")).unwrap();

    let path = store.save("jane_20250101.png", b"not-a-real-png").await.unwrap();
    assert!(path.exists());
    assert_eq!(std::fs::read(&path).unwrap(), b"not-a-real-png");
}
