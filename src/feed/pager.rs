//! Pagination predicates for the infinite-scroll feed list.
//!
//! The next page index is always the number of pages already received;
//! whether that request should happen at all is decided here, from the
//! shape-specific "more data available" rules.

use crate::api::{BrandGroup, Feed, FEED_PAGE_SIZE};
use crate::feed::collection::{Collection, PageData};
use std::collections::HashSet;

/// Zero-based index of the next page to request.
pub fn next_page_index(collection: &Collection) -> usize {
    collection.page_count()
}

/// Flat pages signal more data by arriving full; a short page means the
/// backend is exhausted and pagination ends for the session.
pub fn flat_page_has_more(page: &[Feed]) -> bool {
    page.len() >= FEED_PAGE_SIZE
}

/// Brand pages signal more data by introducing at least one brand name not
/// seen in any prior page. A page whose names are all duplicates stops
/// pagination — some backends cycle brand groups forever otherwise.
pub fn brand_page_has_more(seen: &HashSet<String>, page: &[BrandGroup]) -> bool {
    !page.is_empty() && page.iter().any(|group| !seen.contains(&group.brand_name))
}

/// Shape-dispatched predicate: does `page` leave more data behind it?
///
/// `seen` must be the brand names collected from pages *before* this one.
pub fn page_has_more(seen: &HashSet<String>, page: &PageData) -> bool {
    match page {
        PageData::Flat(feeds) => flat_page_has_more(feeds),
        PageData::Brand(groups) => brand_page_has_more(seen, groups),
    }
}
