//! Nearest-neighbor matching of one observation against a gallery snapshot.

use crate::gallery::GallerySnapshot;
use crate::types::Encoding;

/// Outcome of comparing one observation's encoding against a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult {
    NoMatch,
    Matched { identity_id: i64, distance: f32 },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// Strategy for resolving a probe encoding against the gallery.
pub trait Matcher {
    fn best_match(&self, probe: &Encoding, snapshot: &GallerySnapshot) -> MatchResult;
}

/// Euclidean nearest-neighbor matcher with a fixed distance threshold.
///
/// Scans every snapshot entry and keeps the minimum distance. A match is
/// reported only when that minimum is strictly below the threshold — a
/// distance exactly equal to the threshold is a `NoMatch`. Ties at equal
/// minimum distance across different identities resolve to the earliest
/// snapshot entry, so who gets flagged is deterministic for a given
/// snapshot order.
pub struct EuclideanMatcher {
    threshold: f32,
}

impl EuclideanMatcher {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Matcher for EuclideanMatcher {
    fn best_match(&self, probe: &Encoding, snapshot: &GallerySnapshot) -> MatchResult {
        let mut best: Option<(i64, f32)> = None;

        for entry in snapshot.entries() {
            let distance = probe.euclidean_distance(&entry.encoding);
            // Strict `<` keeps the first-encountered entry on equal distances.
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((entry.identity_id, distance)),
            }
        }

        match best {
            Some((identity_id, distance)) if distance < self.threshold => {
                MatchResult::Matched { identity_id, distance }
            }
            _ => MatchResult::NoMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::GalleryEntry;

    fn snapshot(entries: &[(i64, &str, Vec<f32>)]) -> GallerySnapshot {
        GallerySnapshot::new(
            entries
                .iter()
                .map(|(id, name, values)| GalleryEntry {
                    identity_id: *id,
                    name: (*name).into(),
                    encoding: Encoding::new(values.clone()),
                    source_photo: None,
                })
                .collect(),
        )
    }

    #[test]
    fn empty_snapshot_never_matches() {
        let matcher = EuclideanMatcher::new(0.6);
        let probe = Encoding::new(vec![1.0, 2.0]);
        assert_eq!(
            matcher.best_match(&probe, &GallerySnapshot::default()),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn nearest_identity_wins() {
        let snap = snapshot(&[
            (1, "far", vec![10.0, 0.0]),
            (2, "near", vec![0.1, 0.0]),
            (3, "farther", vec![20.0, 0.0]),
        ]);
        let matcher = EuclideanMatcher::new(0.6);
        let result = matcher.best_match(&Encoding::new(vec![0.0, 0.0]), &snap);
        match result {
            MatchResult::Matched { identity_id, distance } => {
                assert_eq!(identity_id, 2);
                assert!((distance - 0.1).abs() < 1e-6);
            }
            MatchResult::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn distance_at_threshold_is_no_match() {
        let snap = snapshot(&[(1, "edge", vec![0.6, 0.0])]);
        let matcher = EuclideanMatcher::new(0.6);
        // Distance is exactly 0.6 — strict inequality rejects it.
        assert_eq!(
            matcher.best_match(&Encoding::new(vec![0.0, 0.0]), &snap),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn distance_just_below_threshold_matches() {
        let snap = snapshot(&[(1, "in", vec![0.59, 0.0])]);
        let matcher = EuclideanMatcher::new(0.6);
        assert!(matcher
            .best_match(&Encoding::new(vec![0.0, 0.0]), &snap)
            .is_match());
    }

    #[test]
    fn equal_distance_tie_breaks_to_first_entry() {
        let snap = snapshot(&[
            (5, "first", vec![0.3, 0.0]),
            (9, "second", vec![-0.3, 0.0]),
        ]);
        let matcher = EuclideanMatcher::new(0.6);
        match matcher.best_match(&Encoding::new(vec![0.0, 0.0]), &snap) {
            MatchResult::Matched { identity_id, .. } => assert_eq!(identity_id, 5),
            MatchResult::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let snap = snapshot(&[
            (1, "a", vec![0.2, 0.1]),
            (2, "b", vec![0.1, 0.2]),
        ]);
        let matcher = EuclideanMatcher::new(0.6);
        let probe = Encoding::new(vec![0.15, 0.15]);
        let first = matcher.best_match(&probe, &snap);
        for _ in 0..10 {
            assert_eq!(matcher.best_match(&probe, &snap), first);
        }
    }
}
