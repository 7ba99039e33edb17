use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
    models::{FilmRecord, PaginationTask},
    services::{fetcher::PageFetcher, parser::parse_films},
};

/// Runs fetch+parse tasks in fixed-size concurrent groups
///
/// Groups run one after another so that at most `group_size` requests are in
/// flight against the source host. Each task owns its own result; a failed
/// fetch contributes zero records and never cancels its siblings. Results are
/// concatenated in submission order whatever order the tasks finish in.
///
/// Tasks live in a `JoinSet`, so dropping this future aborts the in-flight
/// group and nothing partial escapes.
pub async fn run_in_batches(
    fetcher: Arc<dyn PageFetcher>,
    tasks: Vec<PaginationTask>,
    username: &str,
    group_size: usize,
) -> Vec<FilmRecord> {
    let group_size = group_size.max(1);
    let mut films = Vec::new();

    for (group_idx, group) in tasks.chunks(group_size).enumerate() {
        let mut set = JoinSet::new();

        for (slot, task) in group.iter().cloned().enumerate() {
            let fetcher = fetcher.clone();
            let username = username.to_string();
            set.spawn(async move {
                let films = match fetcher.fetch_page(&task.url).await {
                    Some(html) => parse_films(&html, &username, task.kind),
                    None => Vec::new(),
                };
                (slot, films)
            });
        }

        let mut slots: Vec<Vec<FilmRecord>> = vec![Vec::new(); group.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((slot, page_films)) => slots[slot] = page_films,
                Err(e) => {
                    tracing::error!(error = %e, group = group_idx, "Page task join error");
                }
            }
        }

        let group_records: usize = slots.iter().map(Vec::len).sum();
        tracing::debug!(
            group = group_idx,
            tasks = group.len(),
            records = group_records,
            "Batch group completed"
        );

        films.extend(slots.into_iter().flatten());
    }

    films
}
