//! Paginated feed state.
//!
//! Navigation is driven entirely by the service's pagination
//! metadata: the boolean first/last flags gate the controls and the
//! service-provided page numbers are used as-is, never recomputed
//! from the counts.

use shako_types::{Meta, Post, SortDirection, SortField};

/// Query parameters for a feed (or profile posts, or search) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: u32,
    pub page: u32,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: 12,
            page: 1,
            sort: SortField::Created,
            direction: SortDirection::Desc,
        }
    }
}

impl FeedQuery {
    /// Query-string fragments for this page request.
    pub fn params(&self) -> Vec<String> {
        vec![
            format!("limit={}", self.limit),
            format!("page={}", self.page),
            format!("sort={}", self.sort.as_str()),
            format!("sortOrder={}", self.direction.as_str()),
        ]
    }

    pub fn with_page(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

/// One loaded page of posts plus its pagination metadata.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub meta: Meta,
}

impl FeedPage {
    pub fn new(posts: Vec<Post>, meta: Meta) -> Self {
        Self { posts, meta }
    }

    /// Whether a "previous" control should be enabled. Reads the
    /// service flag only.
    pub fn has_previous(&self) -> bool {
        !self.meta.is_first_page
    }

    /// Whether a "next" control should be enabled. Reads the service
    /// flag only.
    pub fn has_next(&self) -> bool {
        !self.meta.is_last_page
    }

    /// The service-provided previous page number, gated on the flag.
    pub fn previous_page(&self) -> Option<u32> {
        if self.meta.is_first_page {
            None
        } else {
            self.meta.previous_page
        }
    }

    /// The service-provided next page number, gated on the flag.
    pub fn next_page(&self) -> Option<u32> {
        if self.meta.is_last_page {
            None
        } else {
            self.meta.next_page
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(first: bool, last: bool, current: u32) -> Meta {
        Meta {
            is_first_page: first,
            is_last_page: last,
            current_page: current,
            previous_page: if first { None } else { Some(current - 1) },
            next_page: if last { None } else { Some(current + 1) },
            page_count: 5,
            total_count: 60,
        }
    }

    #[test]
    fn default_query_matches_feed_defaults() {
        let query = FeedQuery::default();
        assert_eq!(
            query.params(),
            vec!["limit=12", "page=1", "sort=created", "sortOrder=desc"]
        );
    }

    #[test]
    fn navigation_follows_service_flags() {
        let page = FeedPage::new(vec![], meta(true, false, 1));
        assert!(!page.has_previous());
        assert!(page.has_next());
        assert_eq!(page.previous_page(), None);
        assert_eq!(page.next_page(), Some(2));

        let page = FeedPage::new(vec![], meta(false, true, 5));
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(page.previous_page(), Some(4));
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn flags_win_over_page_numbers() {
        // A metadata payload whose flags and numbers disagree: the
        // flags decide.
        let meta = Meta {
            is_first_page: true,
            is_last_page: true,
            current_page: 1,
            previous_page: Some(7),
            next_page: Some(9),
            page_count: 1,
            total_count: 3,
        };
        let page = FeedPage::new(vec![], meta);
        assert_eq!(page.previous_page(), None);
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn with_page_keeps_other_fields() {
        let query = FeedQuery {
            limit: 25,
            ..FeedQuery::default()
        }
        .with_page(3);
        assert_eq!(query.limit, 25);
        assert_eq!(query.page, 3);
    }
}
