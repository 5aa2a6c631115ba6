//! Typed feed collection: the paginated cache shape for each sort mode.
//!
//! The collection is a sum type over the two page shapes the backend can
//! serve — a flat feed sequence for the date sorts, or brand groups for
//! the brand sort. All cache updates pattern-match on the variant, so a
//! page of the wrong shape can never be merged silently.

use crate::api::{BrandGroup, Feed};
use std::collections::HashSet;

// ============================================================================
// Sort Mode
// ============================================================================

/// Active sort mode. Determines page shape, ordering, and the backend
/// `type` code sent with every page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortType {
    #[default]
    Recent,
    Oldest,
    Brand,
}

impl SortType {
    /// Backend `type` query value for this sort.
    pub fn type_code(self) -> u8 {
        match self {
            Self::Recent => 0,
            Self::Oldest => 1,
            Self::Brand => 2,
        }
    }

    pub fn is_brand(self) -> bool {
        matches!(self, Self::Brand)
    }

    /// Parse a sort name as accepted by the `--sort` CLI argument.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "recent" => Some(Self::Recent),
            "oldest" => Some(Self::Oldest),
            "brand" => Some(Self::Brand),
            _ => None,
        }
    }

    /// Cycle order used by the sort key: recent → oldest → brand → recent.
    pub fn next(self) -> Self {
        match self {
            Self::Recent => Self::Oldest,
            Self::Oldest => Self::Brand,
            Self::Brand => Self::Recent,
        }
    }

    /// Human-readable label for the header line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "Recent",
            Self::Oldest => "Oldest",
            Self::Brand => "By brand",
        }
    }
}

// ============================================================================
// Pages and Collection
// ============================================================================

/// One received page, in the shape determined by the sort mode.
#[derive(Debug, Clone, PartialEq)]
pub enum PageData {
    Flat(Vec<Feed>),
    Brand(Vec<BrandGroup>),
}

impl PageData {
    /// Number of feeds carried by this page, across groups for brand pages.
    pub fn feed_count(&self) -> usize {
        match self {
            Self::Flat(feeds) => feeds.len(),
            Self::Brand(groups) => groups.iter().map(|g| g.feeds.len()).sum(),
        }
    }
}

/// Append-only sequence of pages for one sort mode.
///
/// Reset (replaced wholesale) when the sort mode changes; pages of the
/// other shape are rejected rather than coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Flat(Vec<Vec<Feed>>),
    Brand(Vec<Vec<BrandGroup>>),
}

impl Collection {
    /// Empty collection in the shape required by `sort`.
    pub fn empty(sort: SortType) -> Self {
        if sort.is_brand() {
            Self::Brand(Vec::new())
        } else {
            Self::Flat(Vec::new())
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            Self::Flat(pages) => pages.len(),
            Self::Brand(pages) => pages.len(),
        }
    }

    pub fn feed_count(&self) -> usize {
        match self {
            Self::Flat(pages) => pages.iter().map(Vec::len).sum(),
            Self::Brand(pages) => pages
                .iter()
                .flat_map(|page| page.iter())
                .map(|group| group.feeds.len())
                .sum(),
        }
    }

    /// Append a page. Returns `false` (and leaves the collection untouched)
    /// when the page shape does not match the collection shape.
    pub fn push_page(&mut self, page: PageData) -> bool {
        match (self, page) {
            (Self::Flat(pages), PageData::Flat(feeds)) => {
                pages.push(feeds);
                true
            }
            (Self::Brand(pages), PageData::Brand(groups)) => {
                pages.push(groups);
                true
            }
            _ => false,
        }
    }

    /// Flatten every page into a single render-ordered feed list.
    ///
    /// Brand pages flatten group-by-group in page order, matching how the
    /// backend interleaves them.
    pub fn flatten(&self) -> Vec<Feed> {
        let mut out = Vec::with_capacity(self.feed_count());
        self.for_each_feed(|feed| out.push(feed.clone()));
        out
    }

    /// Visit every feed in render order.
    pub fn for_each_feed(&self, mut f: impl FnMut(&Feed)) {
        match self {
            Self::Flat(pages) => {
                for feed in pages.iter().flatten() {
                    f(feed);
                }
            }
            Self::Brand(pages) => {
                for group in pages.iter().flatten() {
                    for feed in &group.feeds {
                        f(feed);
                    }
                }
            }
        }
    }

    /// Patch the favorite flag of one feed wherever it appears.
    ///
    /// Each variant is walked explicitly; there is no untyped structural
    /// update path into the cache.
    pub fn set_favorite(&mut self, feed_id: i64, value: bool) {
        match self {
            Self::Flat(pages) => {
                for feed in pages.iter_mut().flatten() {
                    if feed.id == feed_id {
                        feed.favorite = value;
                    }
                }
            }
            Self::Brand(pages) => {
                for group in pages.iter_mut().flatten() {
                    for feed in &mut group.feeds {
                        if feed.id == feed_id {
                            feed.favorite = value;
                        }
                    }
                }
            }
        }
    }

    /// Brand names present in the collection so far. Empty for flat shapes.
    pub fn seen_brand_names(&self) -> HashSet<String> {
        match self {
            Self::Flat(_) => HashSet::new(),
            Self::Brand(pages) => pages
                .iter()
                .flatten()
                .map(|group| group.brand_name.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(id: i64) -> Feed {
        Feed {
            id,
            thumbnail_url: Some(format!("https://img.example.com/{}.jpg", id)),
            favorite: false,
            brand_name: None,
        }
    }

    fn group(name: &str, ids: &[i64]) -> BrandGroup {
        BrandGroup {
            brand_name: name.to_string(),
            feeds: ids.iter().copied().map(feed).collect(),
        }
    }

    #[test]
    fn test_flatten_preserves_page_order() {
        let mut c = Collection::empty(SortType::Recent);
        assert!(c.push_page(PageData::Flat(vec![feed(1), feed(2)])));
        assert!(c.push_page(PageData::Flat(vec![feed(3)])));

        let ids: Vec<i64> = c.flatten().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(c.page_count(), 2);
        assert_eq!(c.feed_count(), 3);
    }

    #[test]
    fn test_brand_flatten_walks_groups_in_order() {
        let mut c = Collection::empty(SortType::Brand);
        assert!(c.push_page(PageData::Brand(vec![
            group("Aster", &[1, 2]),
            group("Briar", &[3]),
        ])));
        assert!(c.push_page(PageData::Brand(vec![group("Calla", &[4])])));

        let ids: Vec<i64> = c.flatten().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(
            c.seen_brand_names(),
            ["Aster", "Briar", "Calla"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mut c = Collection::empty(SortType::Recent);
        assert!(!c.push_page(PageData::Brand(vec![group("Aster", &[1])])));
        assert_eq!(c.page_count(), 0);
    }

    #[test]
    fn test_set_favorite_patches_both_shapes() {
        let mut flat = Collection::empty(SortType::Oldest);
        flat.push_page(PageData::Flat(vec![feed(1), feed(2)]));
        flat.set_favorite(2, true);
        assert!(flat.flatten()[1].favorite);
        assert!(!flat.flatten()[0].favorite);

        let mut brand = Collection::empty(SortType::Brand);
        brand.push_page(PageData::Brand(vec![group("Aster", &[7])]));
        brand.set_favorite(7, true);
        assert!(brand.flatten()[0].favorite);
    }

    #[test]
    fn test_sort_cycle_covers_all_modes() {
        let start = SortType::Recent;
        assert_eq!(start.next().next().next(), start);
        assert_eq!(SortType::from_name("brand"), Some(SortType::Brand));
        assert_eq!(SortType::from_name("newest"), None);
    }
}
