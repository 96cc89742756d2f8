use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::flashcards::repo_types::Flashcard;
use crate::groups::repo_types::StudyGroup;

pub const PAGE_SIZE: i64 = 10;

/// `?page=N` query, 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

impl PageQuery {
    /// Limit and offset for the store. Pages below 1 select nothing.
    pub fn window(&self) -> (i64, i64) {
        if self.page < 1 {
            return (0, 0);
        }
        let offset = (self.page - 1).saturating_mul(PAGE_SIZE);
        (PAGE_SIZE, offset)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(GroupPage = Page<StudyGroup>, FlashcardPage = Page<Flashcard>)]
pub struct Page<T> {
    /// Total items across all pages.
    pub count: i64,
    #[schema(example = "/groups?page=2")]
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the page for `query` given the total `count` and the already
    /// sliced `results`. `path` is the list endpoint the links point at.
    pub fn new(path: &str, query: PageQuery, count: i64, results: Vec<T>) -> Self {
        let page = query.page;
        let last = last_page(count);
        let link = |n: i64| format!("{path}?page={n}");

        let next = if page < 1 {
            (count > 0).then(|| link(1))
        } else {
            (page.saturating_mul(PAGE_SIZE) < count).then(|| link(page + 1))
        };
        let previous = (page > 1 && last >= 1).then(|| link((page - 1).min(last)));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Highest page number holding at least one item; 0 for an empty collection.
fn last_page(count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slices `items` the way the stores do.
    fn page_of(items: &[u32], page: i64) -> Page<u32> {
        let query = PageQuery { page };
        let (limit, offset) = query.window();
        let results = items
            .iter()
            .copied()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Page::new("/groups", query, items.len() as i64, results)
    }

    #[test]
    fn twenty_five_items_split_ten_ten_five() {
        let items: Vec<u32> = (1..=25).collect();

        let first = page_of(&items, 1);
        assert_eq!(first.count, 25);
        assert_eq!(first.results, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.next.as_deref(), Some("/groups?page=2"));
        assert_eq!(first.previous, None);

        let second = page_of(&items, 2);
        assert_eq!(second.results, (11..=20).collect::<Vec<_>>());
        assert_eq!(second.next.as_deref(), Some("/groups?page=3"));
        assert_eq!(second.previous.as_deref(), Some("/groups?page=1"));

        let third = page_of(&items, 3);
        assert_eq!(third.results, (21..=25).collect::<Vec<_>>());
        assert_eq!(third.next, None);
        assert_eq!(third.previous.as_deref(), Some("/groups?page=2"));
    }

    #[test]
    fn out_of_range_page_is_empty_without_next() {
        let items: Vec<u32> = (1..=25).collect();
        let fourth = page_of(&items, 4);
        assert!(fourth.results.is_empty());
        assert_eq!(fourth.next, None);
        assert_eq!(fourth.previous.as_deref(), Some("/groups?page=3"));

        let far = page_of(&items, 40);
        assert!(far.results.is_empty());
        assert_eq!(far.previous.as_deref(), Some("/groups?page=3"));
    }

    #[test]
    fn page_zero_is_empty_and_points_forward() {
        let items: Vec<u32> = (1..=3).collect();
        let zero = page_of(&items, 0);
        assert!(zero.results.is_empty());
        assert_eq!(zero.next.as_deref(), Some("/groups?page=1"));
        assert_eq!(zero.previous, None);
    }

    #[test]
    fn empty_collection_has_no_links() {
        let first = page_of(&[], 1);
        assert_eq!(first.count, 0);
        assert!(first.results.is_empty());
        assert_eq!(first.next, None);
        assert_eq!(first.previous, None);

        let second = page_of(&[], 2);
        assert_eq!(second.previous, None);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let items: Vec<u32> = (1..=20).collect();
        assert_eq!(page_of(&items, 2).next, None);
    }

    #[test]
    fn query_defaults_to_first_page() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.window(), (PAGE_SIZE, 0));
    }
}
