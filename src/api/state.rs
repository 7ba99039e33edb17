use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{CatalogHandle, HttpPageFetcher, PageFetcher, Scraper};

/// Shared application state
///
/// Nothing here is written after startup: the catalog is immutable and the
/// scraper only holds a fetcher and settings, so no locking is needed.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Scraper,
    /// `None` when the catalog failed to load; scoring then returns nothing
    pub catalog: Option<Arc<CatalogHandle>>,
}

impl AppState {
    pub fn new(scraper: Scraper, catalog: Option<Arc<CatalogHandle>>) -> Self {
        Self { scraper, catalog }
    }

    /// Builds the production state: HTTP fetcher plus the on-disk catalog
    ///
    /// A catalog that fails to load is logged and left out rather than
    /// aborting startup, so scraping keeps working.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&config.user_agent)?);
        let scraper = Scraper::new(
            fetcher,
            config.source_base_url.clone(),
            config.fetch_batch_size,
        );

        let catalog =
            match CatalogHandle::load(&config.catalog_metadata_path, &config.catalog_vectors_path)
                .await
            {
                Ok(catalog) => Some(Arc::new(catalog)),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        metadata = %config.catalog_metadata_path,
                        vectors = %config.catalog_vectors_path,
                        "Catalog failed to load; recommendations disabled"
                    );
                    None
                }
            };

        Ok(Self::new(scraper, catalog))
    }

    pub fn catalog(&self) -> Option<&CatalogHandle> {
        self.catalog.as_deref()
    }
}
