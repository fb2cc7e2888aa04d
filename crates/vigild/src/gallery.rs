//! Atomically swapped gallery snapshots, refreshed from storage.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use vigil_core::GallerySnapshot;
use vigil_store::WatchlistStore;

/// Owns the current gallery snapshot and replaces it wholesale on
/// refresh. Readers always observe one fully-formed snapshot: `current`
/// hands out an `Arc` under a short read lock, and a refresh swaps the
/// pointer in one write.
pub struct GalleryService {
    store: WatchlistStore,
    current: RwLock<Arc<GallerySnapshot>>,
}

impl GalleryService {
    /// Start with an empty snapshot; call [`refresh`](Self::refresh) to
    /// load the roster.
    pub fn new(store: WatchlistStore) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(GallerySnapshot::default())),
        }
    }

    /// Latest published snapshot. Never blocks on a refresh in progress.
    pub fn current(&self) -> Arc<GallerySnapshot> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Reload the roster from storage and publish a new snapshot.
    ///
    /// On failure the previous snapshot is retained, so a storage outage
    /// degrades to matching against the last-known-good roster.
    pub async fn refresh(&self) -> Result<(), vigil_store::Error> {
        match self.store.load_gallery().await {
            Ok(entries) => {
                let snapshot = Arc::new(GallerySnapshot::new(entries));
                tracing::info!(
                    encodings = snapshot.len(),
                    identities = snapshot.identity_count(),
                    "gallery refreshed"
                );
                *self.current.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "gallery refresh failed; keeping previous snapshot");
                Err(err)
            }
        }
    }

    /// Periodic reload task — the roster is edited out-of-process and
    /// picked up on this schedule.
    pub fn spawn_refresh_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                // Failure already logged; the next tick retries.
                let _ = self.refresh().await;
            }
        })
    }
}
