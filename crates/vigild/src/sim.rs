//! Simulation backends for hosts without a camera or recognition model.
//!
//! The synthetic camera emits noisy gray frames; the simulated encoder
//! emits a centered face region every few seconds, occasionally landing
//! near a roster encoding so the full alert pipeline can be exercised
//! end to end on a development machine.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vigil_core::{Encoding, EncoderError, FaceEncoder, Observation, Region};
use vigil_hw::camera::{CameraError, FrameSource};
use vigil_hw::Frame;

use crate::gallery::GalleryService;

/// One simulated detection roughly every 5 seconds at the default frame
/// interval.
const DETECTION_INTERVAL: u64 = 50;
/// Chance that a simulated detection resolves near a roster encoding.
const MATCH_CHANCE: f64 = 0.05;
/// Per-dimension jitter applied to a borrowed roster encoding.
const JITTER: f32 = 0.02;
/// Encoding width produced for non-matching detections.
const ENCODING_DIMS: usize = 128;

/// Frame source that needs no hardware: mid-gray frames with a sprinkle
/// of noise.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    sequence: u32,
    rng: StdRng,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            sequence: 0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        let pixels = (self.width * self.height) as usize;
        let mut data = vec![112u8; pixels];
        for _ in 0..pixels / 64 {
            let idx = self.rng.gen_range(0..pixels);
            data[idx] = self.rng.gen();
        }

        self.sequence = self.sequence.wrapping_add(1);
        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp: Instant::now(),
            sequence: self.sequence,
        })
    }
}

/// Encoder stand-in: periodic synthetic detections, biased toward the
/// roster just often enough to demonstrate alerts.
pub struct SimulatedEncoder {
    gallery: Arc<GalleryService>,
    frames_seen: u64,
    rng: StdRng,
}

impl SimulatedEncoder {
    pub fn new(gallery: Arc<GalleryService>) -> Self {
        Self {
            gallery,
            frames_seen: 0,
            rng: StdRng::from_entropy(),
        }
    }

    fn synthesize_encoding(&mut self) -> Encoding {
        let snapshot = self.gallery.current();
        if !snapshot.is_empty() && self.rng.gen_bool(MATCH_CHANCE) {
            let entry = &snapshot.entries()[self.rng.gen_range(0..snapshot.len())];
            let values = entry
                .encoding
                .values
                .iter()
                .map(|v| v + self.rng.gen_range(-JITTER..=JITTER))
                .collect();
            tracing::debug!(name = %entry.name, "simulated detection near a roster encoding");
            return Encoding::new(values);
        }

        Encoding::new((0..ENCODING_DIMS).map(|_| self.rng.gen_range(0.0..1.0)).collect())
    }
}

impl FaceEncoder for SimulatedEncoder {
    fn observe(
        &mut self,
        _gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Observation>, EncoderError> {
        self.frames_seen += 1;
        if self.frames_seen % DETECTION_INTERVAL != 0 {
            return Ok(Vec::new());
        }

        // A face in the center of the frame.
        let region = Region {
            x: width / 4,
            y: height / 4,
            width: (width / 2).max(1),
            height: (height / 2).max(1),
        };

        Ok(vec![Observation {
            region,
            encoding: self.synthesize_encoding(),
        }])
    }
}
