//! Hardware signal controller — the phase state machine behind the
//! buzzer and status display.

use std::time::{Duration, Instant};

use vigil_hw::Annunciator;

/// What the terminal is doing right now, as far as the operator-facing
/// hardware is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    AlertActive,
}

/// Drives the annunciator from loop events. All hardware failures are
/// logged and absorbed here; callers never see them.
///
/// Timers are lazy: the controller holds deadlines and applies them on
/// the next [`tick`](Self::tick), so it needs no thread of its own.
pub struct SignalController {
    annunciator: Box<dyn Annunciator>,
    phase: Phase,
    alert_duration: Duration,
    idle_timeout: Duration,
    alert_until: Option<Instant>,
    last_activity: Instant,
}

impl SignalController {
    pub fn new(
        annunciator: Box<dyn Annunciator>,
        alert_duration: Duration,
        idle_timeout: Duration,
        now: Instant,
    ) -> Self {
        let mut controller = Self {
            annunciator,
            phase: Phase::Idle,
            alert_duration,
            idle_timeout,
            alert_until: None,
            last_activity: now,
        };
        controller.display("System Ready", "Monitoring...");
        controller
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Apply elapsed-time transitions. Called once per loop iteration.
    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            Phase::AlertActive => {
                if self.alert_until.map(|until| now >= until).unwrap_or(true) {
                    self.alert_until = None;
                    self.phase = Phase::Idle;
                    if let Err(err) = self.annunciator.deactivate() {
                        tracing::warn!(error = %err, "failed to silence alert signal");
                    }
                    self.display("Status: Idle", "Monitoring...");
                    tracing::debug!("alert signal expired");
                }
            }
            Phase::Scanning => {
                if now.saturating_duration_since(self.last_activity) >= self.idle_timeout {
                    self.phase = Phase::Idle;
                    self.display("Scan Complete", "Monitoring...");
                    tracing::info!("no observations within idle timeout; back to idle");
                }
            }
            Phase::Idle => {}
        }
    }

    /// Motion-gate trigger: start (or extend) a scanning window.
    pub fn on_motion(&mut self, now: Instant) {
        if self.phase == Phase::Idle {
            self.display("Motion Detected!", "Scanning...");
        }
        self.enter_scanning(now);
    }

    /// Enter scanning without a motion trigger — used at startup when no
    /// motion gate is configured.
    pub fn begin_scan(&mut self, now: Instant) {
        if self.phase == Phase::Idle {
            self.display("Scanning...", "Monitoring...");
        }
        self.enter_scanning(now);
    }

    /// One frame was processed; `observed` is whether the encoder saw
    /// any face in it.
    pub fn on_frame(&mut self, now: Instant, observed: bool) {
        if observed {
            if self.phase == Phase::Idle {
                self.display("Scanning...", "");
            }
            self.enter_scanning(now);
        }
    }

    /// Idle → Scanning; refreshes the activity clock in any phase. Never
    /// demotes an active alert.
    fn enter_scanning(&mut self, now: Instant) {
        self.last_activity = now;
        if self.phase == Phase::Idle {
            self.phase = Phase::Scanning;
            tracing::info!("scanning");
        }
    }

    /// An alert fired: enter `AlertActive` and (re)start the duration
    /// timer. An alert arriving while one is already active restarts the
    /// timer rather than queuing a second signal.
    pub fn alert_fired(&mut self, now: Instant, name: &str) {
        self.phase = Phase::AlertActive;
        self.alert_until = Some(now + self.alert_duration);
        self.last_activity = now;

        if let Err(err) = self.annunciator.activate(self.alert_duration) {
            tracing::warn!(error = %err, "failed to activate alert signal");
        }
        self.display("ALERT DETECTED!", name);
        tracing::info!(name, "alert signal active");
    }

    /// Force a safe final state: buzzer off, idle display.
    pub fn shutdown(&mut self) {
        self.phase = Phase::Idle;
        self.alert_until = None;
        if let Err(err) = self.annunciator.deactivate() {
            tracing::warn!(error = %err, "failed to silence alert signal on shutdown");
        }
        self.display("System Halted", "");
    }

    fn display(&mut self, line1: &str, line2: &str) {
        if let Err(err) = self.annunciator.set_display(line1, line2) {
            tracing::debug!(error = %err, "display update failed");
        }
    }
}
