//! Keyed query store: the client-side cache behind the feed grid.
//!
//! Cached collections live under explicit [`QueryKey`]s with first-class
//! `invalidate` / `set_data` operations — there is no ambient cache state.
//! A store-wide generation counter orders fetches against sort changes:
//! `reset_feeds` bumps the generation and every in-flight page response
//! carries the generation it was spawned under, so a slow response from an
//! abandoned sort mode is rejected instead of merged.

use crate::api::Album;
use crate::feed::collection::{Collection, PageData, SortType};
use crate::feed::pager;
use std::collections::HashMap;

// ============================================================================
// Keys and Values
// ============================================================================

/// Cache key for one remotely-fetched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The main paginated feed grid for one sort mode.
    Feeds(SortType),
    /// The favorites album listing that depends on favorite toggles.
    FavoritesAlbum,
    /// Album summaries shown by the add-to-album picker.
    Albums,
    /// Face-grouping collections, refreshed after feed deletion.
    Faces,
}

/// Cached value for a key. Keys without a local consumer (favorites album,
/// faces) are tracked for invalidation only and never hold data here.
#[derive(Debug)]
pub enum QueryData {
    Feeds(FeedsQuery),
    Albums(Vec<Album>),
}

/// Pagination state for the active feed collection.
#[derive(Debug)]
pub struct FeedsQuery {
    pub collection: Collection,
    /// The more-data predicate result after the last received page.
    pub has_next: bool,
    /// A page request is outstanding; further requests are no-ops.
    pub in_flight: bool,
}

impl FeedsQuery {
    fn empty(sort: SortType) -> Self {
        Self {
            collection: Collection::empty(sort),
            has_next: true,
            in_flight: false,
        }
    }
}

/// Result of offering a received page to the store.
#[derive(Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// Appended; `has_next` is the refreshed more-data predicate.
    Appended { has_next: bool, feed_count: usize },
    /// Spawned under an older generation or an inactive sort — discarded.
    Stale,
    /// Page shape did not match the collection shape — discarded.
    ShapeMismatch,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Default)]
pub struct QueryStore {
    entries: HashMap<QueryKey, QueryData>,
    active_sort: Option<SortType>,
    generation: u64,
    invalidations: HashMap<QueryKey, u64>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation stamp that future page responses must match.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_sort(&self) -> Option<SortType> {
        self.active_sort
    }

    /// Switch to `sort`: bump the generation, drop every cached feed
    /// collection, and install an empty one for the new mode.
    ///
    /// Returns the new generation for stamping the first page request.
    pub fn reset_feeds(&mut self, sort: SortType) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.entries
            .retain(|key, _| !matches!(key, QueryKey::Feeds(_)));
        self.entries
            .insert(QueryKey::Feeds(sort), QueryData::Feeds(FeedsQuery::empty(sort)));
        self.active_sort = Some(sort);
        tracing::debug!(sort = sort.label(), generation = self.generation, "Feed cache reset");
        self.generation
    }

    /// The active feed query, if a sort mode has been installed.
    pub fn feeds(&self) -> Option<&FeedsQuery> {
        let sort = self.active_sort?;
        match self.entries.get(&QueryKey::Feeds(sort)) {
            Some(QueryData::Feeds(query)) => Some(query),
            _ => None,
        }
    }

    fn feeds_mut(&mut self) -> Option<&mut FeedsQuery> {
        let sort = self.active_sort?;
        match self.entries.get_mut(&QueryKey::Feeds(sort)) {
            Some(QueryData::Feeds(query)) => Some(query),
            _ => None,
        }
    }

    /// Claim the next page request, or `None` when the request must not be
    /// issued: a fetch is already in flight, the predicate says the backend
    /// is exhausted, or no collection is active.
    pub fn begin_page_fetch(&mut self) -> Option<usize> {
        let query = self.feeds_mut()?;
        if query.in_flight || !query.has_next {
            return None;
        }
        query.in_flight = true;
        Some(pager::next_page_index(&query.collection))
    }

    /// Offer a received page stamped with the generation it was spawned
    /// under. Stale and shape-mismatched pages are rejected.
    pub fn complete_page(&mut self, sort: SortType, generation: u64, page: PageData) -> PageOutcome {
        if generation != self.generation || self.active_sort != Some(sort) {
            tracing::debug!(
                sort = sort.label(),
                stamped = generation,
                current = self.generation,
                "Discarding page response from an abandoned fetch"
            );
            return PageOutcome::Stale;
        }
        let Some(query) = self.feeds_mut() else {
            return PageOutcome::Stale;
        };

        let seen = query.collection.seen_brand_names();
        let has_more = pager::page_has_more(&seen, &page);
        if !query.collection.push_page(page) {
            tracing::warn!(sort = sort.label(), "Page shape did not match the active collection");
            query.in_flight = false;
            return PageOutcome::ShapeMismatch;
        }
        query.has_next = has_more;
        query.in_flight = false;
        PageOutcome::Appended {
            has_next: has_more,
            feed_count: query.collection.feed_count(),
        }
    }

    /// Release the in-flight latch after a failed page request, so a manual
    /// retry can issue the same page again. Stale failures are ignored.
    pub fn fail_page(&mut self, sort: SortType, generation: u64) {
        if generation != self.generation || self.active_sort != Some(sort) {
            return;
        }
        if let Some(query) = self.feeds_mut() {
            query.in_flight = false;
        }
    }

    /// Apply a typed updater to the cached value under `key`, when present.
    pub fn set_data(&mut self, key: QueryKey, updater: impl FnOnce(&mut QueryData)) {
        if let Some(data) = self.entries.get_mut(&key) {
            updater(data);
        }
    }

    /// Patch the favorite flag inside the active collection.
    pub fn set_favorite(&mut self, feed_id: i64, value: bool) {
        if let Some(sort) = self.active_sort {
            self.set_data(QueryKey::Feeds(sort), |data| {
                if let QueryData::Feeds(query) = data {
                    query.collection.set_favorite(feed_id, value);
                }
            });
        }
    }

    /// Drop the cached value under `key`; the next consumer refetches.
    pub fn invalidate(&mut self, key: QueryKey) {
        self.entries.remove(&key);
        *self.invalidations.entry(key).or_insert(0) += 1;
        tracing::debug!(?key, "Query invalidated");
    }

    /// Invalidate every album-listing key (album create/add touch them all).
    pub fn invalidate_album_listings(&mut self) {
        self.invalidate(QueryKey::Albums);
        self.invalidate(QueryKey::FavoritesAlbum);
    }

    /// How many times `key` has been invalidated since startup.
    pub fn invalidation_count(&self, key: QueryKey) -> u64 {
        self.invalidations.get(&key).copied().unwrap_or(0)
    }

    pub fn set_albums(&mut self, albums: Vec<Album>) {
        self.entries.insert(QueryKey::Albums, QueryData::Albums(albums));
    }

    pub fn albums(&self) -> Option<&[Album]> {
        match self.entries.get(&QueryKey::Albums) {
            Some(QueryData::Albums(albums)) => Some(albums),
            _ => None,
        }
    }
}
