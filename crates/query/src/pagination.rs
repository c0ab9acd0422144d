use serde::Serialize;

/// Reference to an adjacent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

/// The window of one page over `total` matching records.
///
/// Only the `next`/`prev` descriptors are part of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationWindow {
    #[serde(skip)]
    pub offset: u64,
    #[serde(skip)]
    pub limit: u64,
    #[serde(skip)]
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// Plan the window for a 1-based `page` of `limit` records.
///
/// A page past the end is not an error: it yields an empty window with only
/// `prev` set.
pub fn plan(page: u64, limit: u64, total: u64) -> PaginationWindow {
    let page = page.max(1);
    let limit = limit.max(1);
    let offset = (page - 1).saturating_mul(limit);

    let next = (offset.saturating_add(limit) < total).then_some(PageRef { page: page + 1, limit });
    let prev = (offset > 0).then_some(PageRef { page: page - 1, limit });

    PaginationWindow { offset, limit, total, next, prev }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_page() {
        let window = plan(1, 25, 60);
        assert_eq!(window.offset, 0);
        assert_eq!(window.next, Some(PageRef { page: 2, limit: 25 }));
        assert_eq!(window.prev, None);
    }

    #[test]
    fn test_middle_and_last_page() {
        let middle = plan(2, 25, 60);
        assert_eq!(middle.offset, 25);
        assert!(middle.next.is_some() && middle.prev.is_some());

        let last = plan(3, 25, 60);
        assert_eq!(last.next, None);
        assert_eq!(last.prev, Some(PageRef { page: 2, limit: 25 }));
    }

    #[test]
    fn test_exact_fit_has_no_next() {
        let window = plan(2, 5, 10);
        assert_eq!(window.offset, 5);
        assert_eq!(window.next, None);
    }

    #[test]
    fn test_page_past_the_end() {
        let window = plan(9, 10, 3);
        assert_eq!(window.offset, 80);
        assert_eq!(window.next, None);
        assert_eq!(window.prev, Some(PageRef { page: 8, limit: 10 }));
    }

    #[test]
    fn test_window_properties_hold_across_inputs() {
        for total in 0..20u64 {
            for limit in 1..6u64 {
                for page in 1..8u64 {
                    let window = plan(page, limit, total);
                    assert_eq!(window.offset, (page - 1) * limit);
                    assert_eq!(window.next.is_some(), window.offset + limit < total);
                    assert_eq!(window.prev.is_some(), window.offset > 0);
                }
            }
        }
    }

    #[test]
    fn test_serialized_shape() {
        let body = serde_json::to_value(plan(2, 2, 5)).unwrap();
        assert_eq!(body, json!({ "next": { "page": 3, "limit": 2 }, "prev": { "page": 1, "limit": 2 } }));
        assert_eq!(serde_json::to_value(plan(1, 25, 3)).unwrap(), json!({}));
    }
}
