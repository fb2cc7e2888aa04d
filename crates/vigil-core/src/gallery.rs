//! The immutable gallery snapshot consumed by matching passes.

use std::collections::HashSet;

use crate::types::Encoding;

/// One (identity, reference encoding) pair. An identity enrolled with
/// several reference images contributes one entry per image.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub identity_id: i64,
    pub name: String,
    pub encoding: Encoding,
    /// Roster photo this encoding was extracted from, if recorded.
    pub source_photo: Option<String>,
}

/// Point-in-time view of the watchlist used by one matching pass.
///
/// Snapshots are replaced wholesale on refresh and never mutated in
/// place, so an in-flight match always sees one fully-formed roster.
/// Entry order is the storage load order and decides equal-distance
/// ties in the matcher.
#[derive(Debug, Clone, Default)]
pub struct GallerySnapshot {
    entries: Vec<GalleryEntry>,
}

impl GallerySnapshot {
    pub fn new(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct identities represented.
    pub fn identity_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.identity_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Display name for an identity, if it appears in this snapshot.
    pub fn name_of(&self, identity_id: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.identity_id == identity_id)
            .map(|e| e.name.as_str())
    }

    /// First recorded reference photo for an identity — what an alert
    /// viewer shows next to the evidence capture.
    pub fn reference_photo_of(&self, identity_id: i64) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.identity_id == identity_id)
            .find_map(|e| e.source_photo.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str) -> GalleryEntry {
        GalleryEntry {
            identity_id: id,
            name: name.into(),
            encoding: Encoding::new(vec![0.0]),
            source_photo: None,
        }
    }

    #[test]
    fn identity_count_collapses_duplicate_identities() {
        let snap = GallerySnapshot::new(vec![
            entry(1, "Jane"),
            entry(1, "Jane"),
            entry(2, "Joe"),
        ]);
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.identity_count(), 2);
    }

    #[test]
    fn name_lookup() {
        let snap = GallerySnapshot::new(vec![entry(7, "Jane")]);
        assert_eq!(snap.name_of(7), Some("Jane"));
        assert_eq!(snap.name_of(8), None);
    }

    #[test]
    fn reference_photo_skips_entries_without_one() {
        let mut with_photo = entry(7, "Jane");
        with_photo.source_photo = Some("jane_2.png".into());
        let snap = GallerySnapshot::new(vec![entry(7, "Jane"), with_photo]);
        assert_eq!(snap.reference_photo_of(7), Some("jane_2.png"));
        assert_eq!(snap.reference_photo_of(8), None);
    }
}
