use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Face encoding vector produced by an external recognition model
/// (typically 128-dimensional). Distance between two encodings
/// approximates identity similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance to another encoding. Lower = more similar.
    ///
    /// Vectors of unequal length are compared over their common prefix;
    /// a conforming encoder never produces them.
    pub fn euclidean_distance(&self, other: &Encoding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Pixel bounding region of a detected face within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Map a region found on a frame downscaled by `factor` back onto the
    /// full-resolution frame, clamped to the frame bounds.
    pub fn descale(&self, factor: f32, frame_width: u32, frame_height: u32) -> Region {
        if factor <= 0.0 || factor >= 1.0 {
            return self.clamp(frame_width, frame_height);
        }
        let inv = 1.0 / factor;
        Region {
            x: (self.x as f32 * inv) as u32,
            y: (self.y as f32 * inv) as u32,
            width: (self.width as f32 * inv) as u32,
            height: (self.height as f32 * inv) as u32,
        }
        .clamp(frame_width, frame_height)
    }

    fn clamp(&self, frame_width: u32, frame_height: u32) -> Region {
        let x = self.x.min(frame_width.saturating_sub(1));
        let y = self.y.min(frame_height.saturating_sub(1));
        Region {
            x,
            y,
            width: self.width.min(frame_width - x),
            height: self.height.min(frame_height - y),
        }
    }
}

/// One detected face in one captured frame: where it was, and its
/// encoding. Lives only for the duration of a single match decision.
#[derive(Debug, Clone)]
pub struct Observation {
    pub region: Region,
    pub encoding: Encoding,
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("encoder backend failed: {0}")]
    Backend(String),
}

/// The external face detection + encoding backend.
///
/// Given a grayscale frame, returns zero or more observations. The
/// implementation is opaque to the matching engine; `vigild` ships a
/// simulation backend for hosts without a recognition model.
pub trait FaceEncoder: Send {
    fn observe(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Observation>, EncoderError>;
}
