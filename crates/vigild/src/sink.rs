//! Alert sink — the side-effect pipeline behind a match decision.
//!
//! The capture loop hands an [`AlertIntent`] to a bounded queue and moves
//! straight on to the next frame; a worker task runs the three effect
//! legs (evidence image, alert record, hardware signal) independently,
//! so one failed leg never cancels the others.

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Notify;
use vigil_core::Region;
use vigil_store::{AlertRecord, EvidenceStore, NewAlert, WatchlistStore};

use crate::signal::SignalController;

/// Everything the sink needs to raise one alert, captured at match time.
pub struct AlertIntent {
    pub identity_id: i64,
    pub name: String,
    /// Face region in full-resolution frame coordinates.
    pub region: Region,
    /// Full-resolution grayscale frame the face was seen in.
    pub frame: Vec<u8>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub observed_at: DateTime<Utc>,
    /// Roster photo to show beside the alert, when the gallery has one.
    pub reference_photo: Option<String>,
}

struct QueueInner {
    items: VecDeque<AlertIntent>,
    closed: bool,
}

/// Bounded handoff queue between the capture loop and the sink worker.
///
/// `submit` never blocks: under sustained overload the oldest pending
/// intent is dropped with a warning, because stalling frame acquisition
/// is worse than losing one redundant alert write.
pub struct SinkQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    capacity: usize,
}

impl SinkQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.max(1),
        })
    }

    /// Enqueue an intent. Returns false if the queue is already closed.
    pub fn submit(&self, intent: AlertIntent) -> bool {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.closed {
                tracing::warn!(name = %intent.name, "alert queue closed; dropping intent");
                return false;
            }
            if inner.items.len() >= self.capacity {
                if let Some(dropped) = inner.items.pop_front() {
                    tracing::warn!(
                        name = %dropped.name,
                        capacity = self.capacity,
                        "alert queue full; dropping oldest pending alert"
                    );
                }
            }
            inner.items.push_back(intent);
        }
        self.notify.notify_one();
        true
    }

    /// Stop accepting intents. Already-queued intents are still drained.
    pub fn close(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .closed = true;
        self.notify.notify_waiters();
    }

    /// Next pending intent, or `None` once closed and drained.
    pub async fn pop(&self) -> Option<AlertIntent> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(intent) = inner.items.pop_front() {
                    return Some(intent);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).items.len()
    }

    #[cfg(test)]
    pub fn drain_pending(&self) -> Vec<AlertIntent> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .drain(..)
            .collect()
    }
}

#[derive(Debug, Error)]
enum EvidenceError {
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Store(#[from] vigil_store::Error),
}

/// What actually happened for one raised alert.
pub struct RaiseOutcome {
    pub evidence_path: Option<PathBuf>,
    pub record: Option<AlertRecord>,
}

/// Executes the three alert legs against storage and hardware.
pub struct AlertSink {
    store: WatchlistStore,
    evidence: EvidenceStore,
    controller: Arc<Mutex<SignalController>>,
    terminal_id: String,
}

impl AlertSink {
    pub fn new(
        store: WatchlistStore,
        evidence: EvidenceStore,
        controller: Arc<Mutex<SignalController>>,
        terminal_id: String,
    ) -> Self {
        Self {
            store,
            evidence,
            controller,
            terminal_id,
        }
    }

    /// Worker loop: drain the queue until it is closed and empty.
    pub async fn run(self, queue: Arc<SinkQueue>) {
        while let Some(intent) = queue.pop().await {
            self.raise(intent).await;
        }
        tracing::info!("alert sink drained");
    }

    /// Run the three legs for one intent. Each is attempted regardless of
    /// the others' outcome: a missing evidence image still yields a
    /// record, a failed record write still warns the operator.
    pub async fn raise(&self, intent: AlertIntent) -> RaiseOutcome {
        let evidence_path = match self.save_evidence(&intent).await {
            Ok(Some(path)) => {
                tracing::info!(path = %path.display(), "evidence image saved");
                Some(path)
            }
            Ok(None) => {
                tracing::warn!(name = %intent.name, "face region empty; alert will carry no image");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, name = %intent.name, "evidence save failed; alert will carry no image");
                None
            }
        };

        let record = self
            .store
            .insert_alert(NewAlert {
                identity_id: intent.identity_id,
                terminal_id: self.terminal_id.clone(),
                observed_at: intent.observed_at,
                evidence_path: evidence_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                reference_photo: intent.reference_photo.clone(),
            })
            .await;

        let record = match record {
            Ok(record) => {
                tracing::info!(alert_id = record.id, name = %intent.name, "alert recorded");
                Some(record)
            }
            Err(err) => {
                tracing::error!(error = %err, name = %intent.name, "failed to record alert");
                None
            }
        };

        // Hardware is warned even when both storage legs failed.
        self.controller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .alert_fired(Instant::now(), &intent.name);

        RaiseOutcome {
            evidence_path,
            record,
        }
    }

    /// Crop the observed face out of the frame, encode it as PNG, and
    /// save it under a collision-free name. `Ok(None)` means the region
    /// had no overlap with the frame.
    async fn save_evidence(&self, intent: &AlertIntent) -> Result<Option<PathBuf>, EvidenceError> {
        let r = intent.region;
        let cropped = vigil_hw::frame::crop(
            &intent.frame,
            intent.frame_width,
            intent.frame_height,
            r.x,
            r.y,
            r.width,
            r.height,
        );
        if cropped.is_empty() {
            return Ok(None);
        }

        let cw = r.width.min(intent.frame_width - r.x);
        let ch = r.height.min(intent.frame_height - r.y);
        let img = image::GrayImage::from_raw(cw, ch, cropped)
            .ok_or_else(|| EvidenceError::Encode("crop buffer size mismatch".into()))?;

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| EvidenceError::Encode(e.to_string()))?;

        let file_name = evidence_file_name(&intent.name, intent.observed_at);
        let path = self.evidence.save(&file_name, png.get_ref()).await?;
        Ok(Some(path))
    }
}

/// `<name-slug>_<timestamp>_<uuid8>.png` — unique even if the same
/// identity alerts twice in one second on two terminals sharing storage.
fn evidence_file_name(name: &str, observed_at: DateTime<Utc>) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let stamp = observed_at.format("%Y%m%d_%H%M%S");
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("{slug}_{stamp}_{}.png", &nonce[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{intent_for, new_controller};
    use vigil_core::Encoding;

    async fn fixture() -> (AlertSink, WatchlistStore, tempfile::TempDir, crate::testutil::RecordingAnnunciator, i64) {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::open_in_memory().await.unwrap();
        let id = store.add_identity("Jane Doe", None, None).await.unwrap().id;
        store
            .add_encoding(id, &Encoding::new(vec![0.0; 8]), None)
            .await
            .unwrap();

        let (controller, recorder) = new_controller();
        let sink = AlertSink::new(
            store.clone(),
            EvidenceStore::new(dir.path().join("evidence")).unwrap(),
            controller,
            "TERM-TEST".into(),
        );
        (sink, store, dir, recorder, id)
    }

    #[tokio::test]
    async fn raise_writes_image_record_and_signal() {
        let (sink, store, _dir, recorder, id) = fixture().await;

        let mut intent = intent_for(id, "Jane Doe");
        intent.reference_photo = Some("jane_ref.png".into());
        let outcome = sink.raise(intent).await;

        let evidence = outcome.evidence_path.expect("evidence saved");
        assert!(evidence.exists());

        let record = outcome.record.expect("alert recorded");
        assert_eq!(record.identity_id, id);
        assert_eq!(record.terminal_id, "TERM-TEST");
        assert_eq!(record.reference_photo.as_deref(), Some("jane_ref.png"));
        assert_eq!(
            record.evidence_path.as_deref(),
            Some(evidence.to_string_lossy().as_ref())
        );

        assert_eq!(store.recent_alerts(10).await.unwrap().len(), 1);
        assert_eq!(recorder.activations(), 1);
    }

    #[tokio::test]
    async fn failed_record_write_keeps_evidence_and_still_signals() {
        let (sink, store, _dir, recorder, _id) = fixture().await;

        // No identity 999 exists, so the insert leg fails on the foreign
        // key while the other legs proceed.
        let outcome = sink.raise(intent_for(999, "Ghost")).await;

        let evidence = outcome.evidence_path.expect("evidence saved");
        assert!(evidence.exists(), "successful image leg must not roll back");
        assert!(outcome.record.is_none());
        assert!(store.recent_alerts(10).await.unwrap().is_empty());
        assert_eq!(recorder.activations(), 1);
    }

    #[tokio::test]
    async fn empty_face_region_yields_record_without_image() {
        let (sink, _store, _dir, recorder, id) = fixture().await;

        let mut intent = intent_for(id, "Jane Doe");
        intent.region = Region { x: intent.frame_width, y: 0, width: 10, height: 10 };

        let outcome = sink.raise(intent).await;
        assert!(outcome.evidence_path.is_none());
        let record = outcome.record.expect("alert recorded");
        assert!(record.evidence_path.is_none());
        assert_eq!(recorder.activations(), 1);
    }

    #[tokio::test]
    async fn queue_drops_oldest_when_full() {
        let queue = SinkQueue::new(2);
        assert!(queue.submit(intent_for(1, "first")));
        assert!(queue.submit(intent_for(2, "second")));
        assert!(queue.submit(intent_for(3, "third")));

        assert_eq!(queue.pending(), 2);
        let pending = queue.drain_pending();
        assert_eq!(pending[0].identity_id, 2);
        assert_eq!(pending[1].identity_id, 3);
    }

    #[tokio::test]
    async fn closed_queue_rejects_but_drains() {
        let queue = SinkQueue::new(4);
        queue.submit(intent_for(1, "queued"));
        queue.close();

        assert!(!queue.submit(intent_for(2, "late")));
        assert_eq!(queue.pop().await.map(|i| i.identity_id), Some(1));
        assert!(queue.pop().await.is_none());
    }

    #[test]
    fn evidence_names_are_sluggified_and_unique() {
        let at = Utc::now();
        let a = evidence_file_name("Jane Doe", at);
        let b = evidence_file_name("Jane Doe", at);
        assert!(a.starts_with("jane_doe_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
