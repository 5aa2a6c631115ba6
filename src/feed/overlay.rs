//! Favorite overlay: local favorite flags shadowing fetched data.
//!
//! The overlay is seeded from every fetch, but an entry confirmed by a
//! toggle response is pinned — a slower fetch that started before the
//! toggle cannot regress it when its response finally arrives.

use crate::api::Feed;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    /// Value came from a fetched page.
    Seeded,
    /// Value was confirmed by a toggle response; reseeds cannot overwrite it.
    Toggled,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    favorite: bool,
    provenance: Provenance,
}

/// Feed id → favorite flag, with provenance tracking.
#[derive(Debug, Default)]
pub struct FavoriteOverlay {
    entries: HashMap<i64, Entry>,
}

impl FavoriteOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed (or reseed) the overlay from fetched feeds.
    ///
    /// Only seed-provenance entries are overwritten; toggled entries win.
    pub fn seed<'a>(&mut self, feeds: impl IntoIterator<Item = &'a Feed>) {
        for feed in feeds {
            match self.entries.get(&feed.id) {
                Some(entry) if entry.provenance == Provenance::Toggled => {}
                _ => {
                    self.entries.insert(
                        feed.id,
                        Entry {
                            favorite: feed.favorite,
                            provenance: Provenance::Seeded,
                        },
                    );
                }
            }
        }
    }

    /// Record a confirmed toggle response. Pins the entry against reseeds.
    pub fn apply_toggle(&mut self, feed_id: i64, favorite: bool) {
        self.entries.insert(
            feed_id,
            Entry {
                favorite,
                provenance: Provenance::Toggled,
            },
        );
    }

    /// Effective favorite flag for a feed: overlay value if present,
    /// otherwise the flag the feed itself carries.
    pub fn is_favorite(&self, feed: &Feed) -> bool {
        self.entries
            .get(&feed.id)
            .map(|entry| entry.favorite)
            .unwrap_or(feed.favorite)
    }

    /// Raw overlay value by id, when known.
    pub fn get(&self, feed_id: i64) -> Option<bool> {
        self.entries.get(&feed_id).map(|entry| entry.favorite)
    }

    /// Drop everything — used when the collection resets on a sort change.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
