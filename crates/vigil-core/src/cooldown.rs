//! Per-identity alert cooldown.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Suppresses repeat alerts for the same identity within a fixed window,
/// so one sighting episode yields exactly one alert.
///
/// There is no timer: an identity's state is computed lazily from the
/// elapsed time since its last fire. State is held in memory only and
/// resets on restart, which can re-alert once after a crash inside an
/// active window.
pub struct CooldownGate {
    window: Duration,
    last_fired: Mutex<HashMap<i64, Instant>>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Atomic check-and-set: returns `true` and records `now` iff no alert
    /// for this identity fired within the window. Two concurrent callers
    /// naming the same identity cannot both fire.
    pub fn should_alert(&self, identity_id: i64, now: Instant) -> bool {
        let mut last = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        match last.get(&identity_id) {
            Some(&fired) if now.saturating_duration_since(fired) < self.window => false,
            _ => {
                last.insert(identity_id, now);
                true
            }
        }
    }
}
