use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters steering a paged listing.
///
/// Values are deserialized leniently: anything absent or unparsable becomes
/// `None` and falls back to the defaults below. Pagination feeds rendering, so
/// a bad query string degrades to page one instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct PagingQuery {
    #[serde(default, deserialize_with = "lenient_usize")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_usize")]
    pub per_page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_usize")]
    pub page_size: Option<usize>,
    pub q: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

const DEFAULT_PER_PAGE: usize = 10;
const DEFAULT_PAGE_SIZE: usize = 10;

impl PagingQuery {
    pub fn page(&self) -> usize {
        self.page.filter(|&p| p > 0).unwrap_or(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 50)
    }

    /// Search term with surrounding whitespace removed, `None` when empty.
    pub fn terms(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
    }
}

fn lenient_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Fully derived paging state for one request.
///
/// Pages are grouped into "sets" of `page_size` page links so the link control
/// stays bounded no matter how many pages exist. Everything is recomputed from
/// the four inputs on each request and nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagingState {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub current_set: usize,
    pub total_set: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub first_page: usize,
    pub last_page: usize,
    pub previous_page: usize,
    pub next_page: usize,
    pub has_previous_set: bool,
    pub has_next_set: bool,
}

impl PagingState {
    /// Derive the full paging state from raw counts.
    ///
    /// Inputs are clamped rather than rejected: `page`, `per_page` and
    /// `page_size` are floored to 1, and an empty collection still yields page
    /// one so the empty state renders instead of an out-of-range error. A
    /// `page` beyond the last page clamps into the final set; the link range
    /// then simply does not contain it, so no link renders as active.
    pub fn derive(total: usize, page: usize, per_page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let page_size = page_size.max(1);

        let total_pages = total.div_ceil(per_page).max(1);
        let total_set = total_pages.div_ceil(page_size);
        let current_set = page.div_ceil(page_size).clamp(1, total_set);

        let start_page = (current_set - 1) * page_size + 1;
        let end_page = (start_page + page_size - 1).min(total_pages);

        Self {
            total,
            page,
            per_page,
            page_size,
            total_pages,
            current_set,
            total_set,
            start_page,
            end_page,
            first_page: 1,
            last_page: total_pages,
            previous_page: start_page.saturating_sub(page_size).max(1),
            next_page: (start_page + page_size).min(total_pages),
            has_previous_set: current_set > 1,
            has_next_set: total_set > current_set,
        }
    }

    /// Derive from a query plus the total reported by the data fetch.
    pub fn from_query(query: &PagingQuery, total: usize) -> Self {
        Self::derive(total, query.page(), query.per_page(), query.page_size())
    }

    /// Row offset for the data fetch backing this page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// The page numbers rendered as links in the current set.
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        self.start_page..=self.end_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_still_has_page_one() {
        let state = PagingState::derive(0, 1, 10, 5);

        assert_eq!(state.total_pages, 1);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.total_set, 1);
        assert_eq!(state.start_page, 1);
        assert_eq!(state.end_page, 1);
        assert_eq!(state.first_page, 1);
        assert_eq!(state.last_page, 1);
        assert!(!state.has_previous_set);
        assert!(!state.has_next_set);
    }

    #[test]
    fn first_set_of_a_two_set_listing() {
        let state = PagingState::derive(95, 1, 10, 5);

        assert_eq!(state.total_pages, 10);
        assert_eq!(state.total_set, 2);
        assert_eq!(state.current_set, 1);
        assert_eq!(state.start_page, 1);
        assert_eq!(state.end_page, 5);
        assert_eq!(state.next_page, 6);
        assert_eq!(state.last_page, 10);
        assert!(!state.has_previous_set);
        assert!(state.has_next_set);
    }

    #[test]
    fn second_set_reaches_back_to_the_first() {
        let state = PagingState::derive(95, 7, 10, 5);

        assert_eq!(state.current_set, 2);
        assert_eq!(state.start_page, 6);
        assert_eq!(state.end_page, 10);
        assert_eq!(state.previous_page, 1);
        assert!(state.has_previous_set);
        assert!(!state.has_next_set);
    }

    #[test]
    fn exact_division_has_no_trailing_page() {
        let state = PagingState::derive(100, 1, 10, 5);
        assert_eq!(state.total_pages, 10);

        let uneven = PagingState::derive(101, 1, 10, 5);
        assert_eq!(uneven.total_pages, 11);
    }

    #[test]
    fn out_of_range_page_clamps_into_the_last_set() {
        let state = PagingState::derive(95, 999, 10, 5);

        assert_eq!(state.total_pages, 10);
        assert_eq!(state.current_set, 2);
        assert_eq!(state.start_page, 6);
        assert_eq!(state.end_page, 10);
        // The requested page is kept verbatim; it is simply not among the
        // rendered links, so nothing is highlighted as active.
        assert_eq!(state.page, 999);
        assert!(state.pages().all(|p| p != state.page));
    }

    #[test]
    fn zero_inputs_are_floored() {
        let state = PagingState::derive(95, 0, 0, 0);

        assert_eq!(state.page, 1);
        assert_eq!(state.per_page, 1);
        assert_eq!(state.page_size, 1);
        assert_eq!(state.total_pages, 95);
        assert_eq!(state.start_page, 1);
        assert_eq!(state.end_page, 1);
    }

    #[test]
    fn derive_is_pure() {
        let a = PagingState::derive(95, 7, 10, 5);
        let b = PagingState::derive(95, 7, 10, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn invariants_hold_across_a_grid_of_inputs() {
        for total in [0, 1, 9, 10, 11, 95, 100, 1000] {
            for page in [1, 2, 7, 10, 999] {
                for per_page in [1, 3, 10, 25] {
                    for page_size in [1, 5, 10] {
                        let s = PagingState::derive(total, page, per_page, page_size);
                        assert!(s.total_pages >= 1);
                        assert!(s.total_set >= 1);
                        assert!((1..=s.total_set).contains(&s.current_set));
                        assert!(s.start_page >= 1);
                        assert!(s.start_page <= s.end_page);
                        assert!(s.end_page <= s.total_pages);
                        assert!(s.previous_page >= 1);
                        assert!(s.next_page <= s.total_pages);
                    }
                }
            }
        }
    }

    #[test]
    fn offset_matches_the_requested_slice() {
        let state = PagingState::derive(95, 3, 10, 5);
        assert_eq!(state.offset(), 20);

        let first = PagingState::derive(95, 1, 10, 5);
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn query_defaults_and_lenient_parsing() {
        let query: PagingQuery =
            serde_urlencoded::from_str("page=7&per_page=25&page_size=5&q=+hello+")
                .expect("Failed to parse query");
        assert_eq!(query.page(), 7);
        assert_eq!(query.per_page(), 25);
        assert_eq!(query.page_size(), 5);
        assert_eq!(query.terms(), Some("hello".to_string()));

        let garbage: PagingQuery =
            serde_urlencoded::from_str("page=banana&per_page=-3&page_size=")
                .expect("Garbage should not reject");
        assert_eq!(garbage.page(), 1);
        assert_eq!(garbage.per_page(), 10);
        assert_eq!(garbage.page_size(), 10);
        assert_eq!(garbage.terms(), None);

        let oversized: PagingQuery = serde_urlencoded::from_str("per_page=100000&page_size=9999")
            .expect("Failed to parse query");
        assert_eq!(oversized.per_page(), 100);
        assert_eq!(oversized.page_size(), 50);
    }
}
