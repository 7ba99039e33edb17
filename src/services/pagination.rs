use crate::models::{ListKind, PaginationTask};

/// URL of the first page of a list
pub fn first_page_url(base_url: &str, username: &str, kind: ListKind) -> String {
    format!("{}/{}/{}/", base_url, username, kind.path_segment())
}

/// URL of page `page` (2 or greater) of a list
pub fn page_url(base_url: &str, username: &str, kind: ListKind, page: u32) -> String {
    format!(
        "{}/{}/{}/page/{}/",
        base_url,
        username,
        kind.path_segment(),
        page
    )
}

/// Number of pages needed to hold `count` items of the given list
pub fn page_count(count: u32, kind: ListKind) -> u32 {
    count.div_ceil(kind.page_size())
}

/// Plans fetch tasks for pages 2..=N of a list
///
/// Page 1 has already been fetched to learn `count`, so a list that fits in
/// one page yields no tasks.
pub fn plan_remaining_pages(
    base_url: &str,
    username: &str,
    kind: ListKind,
    count: u32,
) -> Vec<PaginationTask> {
    (2..=page_count(count, kind))
        .map(|page| PaginationTask {
            url: page_url(base_url, username, kind, page),
            kind,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://letterboxd.com";

    #[test]
    fn test_watched_boundaries() {
        assert!(plan_remaining_pages(BASE, "a", ListKind::Watched, 0).is_empty());
        assert!(plan_remaining_pages(BASE, "a", ListKind::Watched, 72).is_empty());
        assert_eq!(plan_remaining_pages(BASE, "a", ListKind::Watched, 73).len(), 1);
        assert_eq!(plan_remaining_pages(BASE, "a", ListKind::Watched, 144).len(), 1);
        assert_eq!(plan_remaining_pages(BASE, "a", ListKind::Watched, 145).len(), 2);
    }

    #[test]
    fn test_watchlist_boundaries() {
        assert!(plan_remaining_pages(BASE, "a", ListKind::Watchlist, 28).is_empty());
        assert_eq!(plan_remaining_pages(BASE, "a", ListKind::Watchlist, 29).len(), 1);
        assert_eq!(plan_remaining_pages(BASE, "a", ListKind::Watchlist, 0).len(), 0);
    }

    #[test]
    fn test_task_urls_start_at_page_two() {
        let tasks = plan_remaining_pages(BASE, "alice", ListKind::Watched, 200);

        let urls: Vec<&str> = tasks.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://letterboxd.com/alice/films/page/2/",
                "https://letterboxd.com/alice/films/page/3/",
            ]
        );
        assert!(tasks.iter().all(|t| t.kind == ListKind::Watched));
    }

    #[test]
    fn test_first_page_urls() {
        assert_eq!(
            first_page_url(BASE, "alice", ListKind::Watchlist),
            "https://letterboxd.com/alice/watchlist/"
        );
        assert_eq!(
            first_page_url(BASE, "alice", ListKind::Watched),
            "https://letterboxd.com/alice/films/"
        );
    }
}
