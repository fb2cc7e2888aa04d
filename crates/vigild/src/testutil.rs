//! Shared mock collaborators for daemon tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use vigil_core::{Encoding, EncoderError, FaceEncoder, Observation, Region};
use vigil_hw::camera::{CameraError, FrameSource};
use vigil_hw::{Annunciator, AnnunciatorError, Frame};

use crate::signal::SignalController;
use crate::sink::AlertIntent;

#[derive(Default)]
struct RecorderState {
    activations: u32,
    deactivations: u32,
    displays: Vec<(String, String)>,
}

/// Annunciator that records every call for assertions.
#[derive(Clone, Default)]
pub struct RecordingAnnunciator {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingAnnunciator {
    pub fn activations(&self) -> u32 {
        self.state.lock().unwrap().activations
    }

    pub fn deactivations(&self) -> u32 {
        self.state.lock().unwrap().deactivations
    }

    pub fn last_display(&self) -> Option<(String, String)> {
        self.state.lock().unwrap().displays.last().cloned()
    }
}

impl Annunciator for RecordingAnnunciator {
    fn activate(&mut self, _duration: Duration) -> Result<(), AnnunciatorError> {
        self.state.lock().unwrap().activations += 1;
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), AnnunciatorError> {
        self.state.lock().unwrap().deactivations += 1;
        Ok(())
    }

    fn set_display(&mut self, line1: &str, line2: &str) -> Result<(), AnnunciatorError> {
        self.state
            .lock()
            .unwrap()
            .displays
            .push((line1.into(), line2.into()));
        Ok(())
    }
}

/// Controller wired to a recording annunciator, with short test timers.
pub fn new_controller() -> (Arc<Mutex<SignalController>>, RecordingAnnunciator) {
    let recorder = RecordingAnnunciator::default();
    let controller = SignalController::new(
        Box::new(recorder.clone()),
        Duration::from_secs(5),
        Duration::from_secs(30),
        Instant::now(),
    );
    (Arc::new(Mutex::new(controller)), recorder)
}

/// A 64x48 gradient frame so evidence crops contain real pixel data.
pub fn test_frame(sequence: u32) -> Frame {
    let (width, height) = (64u32, 48u32);
    let data = (0..width * height).map(|i| (i % 251) as u8).collect();
    Frame {
        data,
        width,
        height,
        timestamp: Instant::now(),
        sequence,
    }
}

/// An alert intent over a synthetic frame with an in-bounds face region.
pub fn intent_for(identity_id: i64, name: &str) -> AlertIntent {
    let frame = test_frame(0);
    AlertIntent {
        identity_id,
        name: name.into(),
        region: Region { x: 8, y: 8, width: 16, height: 16 },
        frame_width: frame.width,
        frame_height: frame.height,
        frame: frame.data,
        observed_at: Utc::now(),
        reference_photo: None,
    }
}

/// Frame source that plays a fixed script, then raises the stop flag so
/// the loop under test winds down on its own.
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
    taken: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Frame>, stop: Arc<AtomicBool>) -> (Self, Arc<AtomicUsize>) {
        let taken = Arc::new(AtomicUsize::new(0));
        (
            Self {
                frames: frames.into(),
                taken: taken.clone(),
                stop,
            },
            taken,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.taken.fetch_add(1, Ordering::Relaxed);
                Ok(frame)
            }
            None => {
                self.stop.store(true, Ordering::Relaxed);
                Err(CameraError::CaptureFailed("script exhausted".into()))
            }
        }
    }
}

/// Encoder that returns one scripted observation set per frame.
pub struct ScriptedEncoder {
    script: VecDeque<Vec<Observation>>,
}

impl ScriptedEncoder {
    pub fn new(script: Vec<Vec<Observation>>) -> Self {
        Self { script: script.into() }
    }
}

impl FaceEncoder for ScriptedEncoder {
    fn observe(
        &mut self,
        _gray: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<Observation>, EncoderError> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// An observation whose encoding sits at `distance` from the all-zero
/// reference encoding.
pub fn observation_at_distance(distance: f32, dims: usize) -> Observation {
    let mut values = vec![0.0f32; dims];
    values[0] = distance;
    Observation {
        region: Region { x: 8, y: 8, width: 16, height: 16 },
        encoding: Encoding::new(values),
    }
}
