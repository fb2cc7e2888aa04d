//! The capture loop: one dedicated OS thread turning frames into
//! deduplicated alert intents.
//!
//! The loop never blocks on disk or database work — a match hands an
//! intent to the sink queue and moves on. Frame or encoder failures skip
//! the frame; only a stop request ends the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use vigil_core::{CooldownGate, EuclideanMatcher, FaceEncoder, MatchResult, Matcher};
use vigil_hw::camera::FrameSource;
use vigil_hw::frame;
use vigil_hw::MotionGate;

use crate::gallery::GalleryService;
use crate::signal::{Phase, SignalController};
use crate::sink::{AlertIntent, SinkQueue};

/// Collaborators and tuning for one capture loop.
pub struct Watcher {
    pub frames: Box<dyn FrameSource>,
    pub encoder: Box<dyn FaceEncoder>,
    /// `None` disables motion gating; the loop scans unconditionally.
    pub gate: Option<Box<dyn MotionGate>>,
    pub gallery: Arc<GalleryService>,
    pub matcher: EuclideanMatcher,
    pub cooldown: CooldownGate,
    pub controller: Arc<Mutex<SignalController>>,
    pub queue: Arc<SinkQueue>,
    pub scale_factor: f32,
    pub frame_interval: Duration,
    pub motion_poll: Duration,
}

/// Handle to a running capture loop.
pub struct WatcherHandle {
    stop: Arc<AtomicBool>,
    thread: std::thread::JoinHandle<()>,
}

impl WatcherHandle {
    /// Request a cooperative stop (honored within one frame interval)
    /// and wait for the loop thread to finish.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.thread.join().is_err() {
            tracing::error!("capture loop thread panicked");
        }
    }
}

/// Spawn the capture loop on a dedicated OS thread.
pub fn spawn_watcher(watcher: Watcher) -> std::io::Result<WatcherHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let thread = std::thread::Builder::new()
        .name("vigil-watch".into())
        .spawn(move || run_loop(watcher, stop_flag))?;
    Ok(WatcherHandle { stop, thread })
}

fn lock<'a>(
    controller: &'a Arc<Mutex<SignalController>>,
) -> std::sync::MutexGuard<'a, SignalController> {
    controller.lock().unwrap_or_else(|e| e.into_inner())
}

pub(crate) fn run_loop(mut w: Watcher, stop: Arc<AtomicBool>) {
    tracing::info!("capture loop started");
    let mut consecutive_failures = 0u32;

    if w.gate.is_none() {
        lock(&w.controller).begin_scan(Instant::now());
    }

    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        lock(&w.controller).tick(now);

        if let Some(gate) = w.gate.as_mut() {
            if gate.motion_detected() {
                lock(&w.controller).on_motion(now);
            } else if lock(&w.controller).phase() == Phase::Idle {
                // Nothing moving, nothing in progress: skip frame work.
                sleep_interruptible(&stop, w.motion_poll, w.frame_interval);
                continue;
            }
        }

        let frame = match w.frames.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                note_failure(&mut consecutive_failures, "capture", &err.to_string());
                sleep_interruptible(&stop, w.frame_interval, w.frame_interval);
                continue;
            }
        };

        let (scaled, scaled_w, scaled_h) =
            frame::downscale(&frame.data, frame.width, frame.height, w.scale_factor);

        let observations = match w.encoder.observe(&scaled, scaled_w, scaled_h) {
            Ok(observations) => {
                consecutive_failures = 0;
                observations
            }
            Err(err) => {
                note_failure(&mut consecutive_failures, "encode", &err.to_string());
                sleep_interruptible(&stop, w.frame_interval, w.frame_interval);
                continue;
            }
        };

        lock(&w.controller).on_frame(now, !observations.is_empty());

        if !observations.is_empty() {
            let snapshot = w.gallery.current();
            for observation in &observations {
                let MatchResult::Matched { identity_id, distance } =
                    w.matcher.best_match(&observation.encoding, &snapshot)
                else {
                    continue;
                };

                if !w.cooldown.should_alert(identity_id, Instant::now()) {
                    tracing::debug!(identity_id, "match within cooldown window; suppressed");
                    continue;
                }

                let name = snapshot
                    .name_of(identity_id)
                    .unwrap_or("unknown")
                    .to_string();
                tracing::info!(identity_id, name = %name, distance, "watchlist match");

                let region =
                    observation
                        .region
                        .descale(w.scale_factor, frame.width, frame.height);
                let reference_photo = snapshot
                    .reference_photo_of(identity_id)
                    .map(str::to_owned);
                w.queue.submit(AlertIntent {
                    identity_id,
                    name,
                    region,
                    frame: frame.data.clone(),
                    frame_width: frame.width,
                    frame_height: frame.height,
                    observed_at: Utc::now(),
                    reference_photo,
                });
            }
        }

        sleep_interruptible(&stop, w.frame_interval, w.frame_interval);
    }

    // The final controller shutdown happens after the sink drains —
    // in-flight alerts may still signal it while the queue empties.
    tracing::info!("capture loop stopped");
}

/// Skipped-frame bookkeeping: the third consecutive failure escalates to
/// a visible warning (camera possibly disconnected); the rest stay quiet.
fn note_failure(count: &mut u32, stage: &str, error: &str) {
    *count += 1;
    if *count == 3 {
        tracing::warn!(stage, error, "3 consecutive frame failures; camera may be disconnected");
    } else {
        tracing::debug!(stage, error, failures = *count, "frame skipped");
    }
}

/// Sleep in step-sized chunks so a stop request is honored within one
/// frame interval even during the longer motion-poll waits.
fn sleep_interruptible(stop: &AtomicBool, total: Duration, step: Duration) {
    let step = step.max(Duration::from_millis(1));
    let mut remaining = total;
    while remaining > Duration::ZERO && !stop.load(Ordering::Relaxed) {
        let chunk = remaining.min(step);
        std::thread::sleep(chunk);
        remaining -= chunk;
    }
}
