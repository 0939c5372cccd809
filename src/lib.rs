pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod results;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use results::{CrawlIndex, PageRecord};
pub use storage::ContentStore;

use crawlers::SiteScraper;
use error::ScrapeError;

/// Run one crawl and persist it, returning the number of pages saved.
///
/// An empty crawl is not persisted.
pub async fn crawl_once(
    scraper: &dyn SiteScraper,
    store: &dyn ContentStore,
) -> Result<usize, ScrapeError> {
    let pages = scraper.scrape().await?;
    if pages.is_empty() {
        ::log::info!("No pages were scraped");
        return Ok(0);
    }

    let index = store.save(&pages).await?;
    ::log::info!(
        "Saved {} pages to {} storage at {}",
        index.page_count,
        store.backend(),
        index.scrape_time
    );
    Ok(index.page_count)
}
