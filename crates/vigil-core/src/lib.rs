//! vigil-core — Watchlist matching and alert gating.
//!
//! Pure domain logic: face encodings, the immutable gallery snapshot model,
//! the nearest-neighbor distance matcher, and the per-identity alert
//! cooldown. No I/O happens in this crate.

pub mod cooldown;
pub mod gallery;
pub mod matcher;
pub mod types;

pub use cooldown::CooldownGate;
pub use gallery::{GalleryEntry, GallerySnapshot};
pub use matcher::{EuclideanMatcher, MatchResult, Matcher};
pub use types::{Encoding, EncoderError, FaceEncoder, Observation, Region};
