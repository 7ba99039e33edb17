pub mod catalog;
pub mod counts;
pub mod fetcher;
pub mod pagination;
pub mod parser;
pub mod recommendations;
pub mod scheduler;
pub mod scraper;
pub mod taste;

pub use catalog::CatalogHandle;
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use scraper::Scraper;
