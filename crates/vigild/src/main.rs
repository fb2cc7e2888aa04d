use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use vigil_core::{CooldownGate, EuclideanMatcher, FaceEncoder};
use vigil_hw::camera::FrameSource;
use vigil_hw::{Annunciator, Camera, ConsoleAnnunciator, GpioMotionGate, InputPin, MotionGate};
use vigil_store::{EvidenceStore, WatchlistStore};

mod config;
mod engine;
mod gallery;
mod signal;
mod sim;
mod sink;
#[cfg(test)]
mod testutil;

use config::{Config, FrameSourceKind, HardwareMode};
use gallery::GalleryService;
use signal::SignalController;
use sim::{SimulatedEncoder, SyntheticCamera};
use sink::{AlertSink, SinkQueue};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    tracing::info!(
        terminal = %config.terminal_id,
        db = %config.db_path.display(),
        "vigild starting"
    );

    let store = WatchlistStore::open(&config.db_path).await?;
    let evidence = EvidenceStore::new(&config.evidence_dir)?;

    let gallery = Arc::new(GalleryService::new(store.clone()));
    if let Err(err) = gallery.refresh().await {
        tracing::warn!(error = %err, "initial gallery load failed; starting with an empty roster");
    }
    if gallery.current().is_empty() {
        tracing::warn!("no reference encodings loaded; detection will not raise alerts");
    }

    let annunciator: Box<dyn Annunciator> = match config.hardware {
        HardwareMode::Console => Box::new(ConsoleAnnunciator),
        HardwareMode::Auto => {
            vigil_hw::annunciator::probe(config.buzzer_pin, &config.lcd_bus, config.lcd_addr)
        }
    };
    let controller = Arc::new(Mutex::new(SignalController::new(
        annunciator,
        config.alert_duration,
        config.idle_timeout,
        Instant::now(),
    )));

    let queue = SinkQueue::new(config.sink_queue);
    let sink = AlertSink::new(
        store.clone(),
        evidence,
        controller.clone(),
        config.terminal_id.clone(),
    );
    let sink_task = tokio::spawn(sink.run(queue.clone()));

    let refresh_task = gallery.clone().spawn_refresh_task(config.refresh_interval);

    let frames = open_frame_source(&config)?;
    let encoder = build_encoder(&config, gallery.clone());
    let gate = open_motion_gate(&config);

    let watcher = engine::spawn_watcher(engine::Watcher {
        frames,
        encoder,
        gate,
        gallery: gallery.clone(),
        matcher: EuclideanMatcher::new(config.match_threshold),
        cooldown: CooldownGate::new(config.cooldown),
        controller: controller.clone(),
        queue: queue.clone(),
        scale_factor: config.scale_factor,
        frame_interval: config.frame_interval,
        motion_poll: config.motion_poll,
    })?;

    tracing::info!("vigild ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("vigild shutting down");

    // Stop the loop, drain in-flight alerts, then force the hardware to
    // a safe state.
    tokio::task::spawn_blocking(move || watcher.stop()).await?;
    refresh_task.abort();
    queue.close();
    sink_task.await?;
    controller
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .shutdown();

    tracing::info!("vigild stopped");
    Ok(())
}

fn open_frame_source(config: &Config) -> Result<Box<dyn FrameSource>> {
    match config.frame_source {
        FrameSourceKind::Camera => {
            // Explicitly requested: fail fast if the camera is unusable.
            let camera = Camera::open(
                &config.camera_device,
                config.camera_width,
                config.camera_height,
            )?;
            Ok(Box::new(camera))
        }
        FrameSourceKind::Synthetic => {
            tracing::info!("using synthetic frame source");
            Ok(Box::new(SyntheticCamera::new(
                config.camera_width,
                config.camera_height,
            )))
        }
        FrameSourceKind::Auto => {
            if std::path::Path::new(&config.camera_device).exists() {
                match Camera::open(
                    &config.camera_device,
                    config.camera_width,
                    config.camera_height,
                ) {
                    Ok(camera) => return Ok(Box::new(camera)),
                    Err(err) => {
                        tracing::warn!(error = %err, "camera open failed; falling back to synthetic frames");
                    }
                }
            } else {
                tracing::info!(
                    device = %config.camera_device,
                    "no camera device present; using synthetic frames"
                );
            }
            Ok(Box::new(SyntheticCamera::new(
                config.camera_width,
                config.camera_height,
            )))
        }
    }
}

fn build_encoder(config: &Config, gallery: Arc<GalleryService>) -> Box<dyn FaceEncoder> {
    if config.encoder != "sim" {
        tracing::warn!(encoder = %config.encoder, "unknown encoder backend; using the simulation");
    }
    Box::new(SimulatedEncoder::new(gallery))
}

fn open_motion_gate(config: &Config) -> Option<Box<dyn MotionGate>> {
    let pin = config.motion_pin?;
    match InputPin::open(pin) {
        Ok(input) => {
            tracing::info!(pin, "motion gating enabled");
            Some(Box::new(GpioMotionGate::new(input)))
        }
        Err(err) => {
            tracing::warn!(error = %err, pin, "motion sensor setup failed; scanning ungated");
            None
        }
    }
}
