use crate::config::ScraperConfig;
use crate::crawlers::crawler::PageFetcher;
use crate::error::CrawlError;
use crate::parsers::PageExtractor;
use crate::results::PageRecord;
use tokio::time::sleep;

/// Runs one crawl with `fetcher` and releases it whatever the outcome
pub async fn crawl_and_close<F: PageFetcher>(
    mut fetcher: F,
    config: &ScraperConfig,
) -> Result<Vec<PageRecord>, CrawlError> {
    let result = run_crawl(&mut fetcher, config).await;

    if let Err(e) = fetcher.close().await {
        ::log::warn!("Failed to close browser: {}", e);
    } else {
        ::log::info!("Browser closed");
    }

    result
}

/// Loads the seed page, takes the first `max_pages` site links it exposes
/// and scrapes them one after another.
///
/// Only a failure to load the seed aborts the crawl; every other page is
/// isolated and skipped on error.
pub async fn run_crawl<F: PageFetcher>(
    fetcher: &mut F,
    config: &ScraperConfig,
) -> Result<Vec<PageRecord>, CrawlError> {
    let extractor = PageExtractor::from_config(config)?;

    ::log::info!("Navigating to {}...", config.seed_url);
    fetcher.open(&config.seed_url, config.seed_timeout()).await?;

    ::log::info!("Collecting all URLs from the website...");
    let hrefs = fetcher.link_hrefs().await?;
    let mut urls = extractor.filter().collect(&hrefs);
    ::log::info!(
        "Found {} unique URLs. Starting to scrape each page...",
        urls.len()
    );
    urls.truncate(config.max_pages);

    let mut pages = Vec::with_capacity(urls.len());
    for (i, url) in urls.iter().enumerate() {
        ::log::info!("Scraping: {}", url);

        match scrape_page(fetcher, &extractor, url, config).await {
            Ok(page) => {
                ::log::info!("- Successfully scraped: {}", page.title);
                pages.push(page);
            }
            Err(e) => {
                ::log::error!("- Error scraping {}: {}", url, e);
            }
        }

        if i + 1 < urls.len() {
            sleep(config.request_delay()).await;
        }
    }

    ::log::info!("Completed scraping {} pages successfully", pages.len());
    Ok(pages)
}

/// Scrapes a single URL, falling back to DOM evaluation when the markup
/// cannot be parsed
async fn scrape_page<F: PageFetcher>(
    fetcher: &mut F,
    extractor: &PageExtractor,
    url: &str,
    config: &ScraperConfig,
) -> Result<PageRecord, CrawlError> {
    fetcher.open(url, config.page_timeout()).await?;

    // Deferred content
    sleep(config.settle_delay()).await;

    let html = fetcher.html().await?;
    match extractor.extract(&html, url) {
        Ok(page) => Ok(page),
        Err(e) => {
            ::log::error!("- Error parsing HTML: {}", e);
            let info = fetcher.basic_info().await?;
            let page = extractor.fallback(url, info);
            ::log::info!("- Scraped basic info using DOM evaluation: {}", page.title);
            Ok(page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::parsers::BasicPageInfo;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SEED: &str = "https://www.example.com";

    #[derive(Default)]
    struct FakeFetcher {
        seed_links: Vec<String>,
        pages: HashMap<String, String>,
        failing: HashSet<String>,
        broken_dom: HashSet<String>,
        current: String,
        visited: Vec<String>,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn open(&mut self, url: &str, wait: Duration) -> Result<(), CrawlError> {
            if self.failing.contains(url) {
                return Err(CrawlError::NavigationTimeout {
                    url: url.to_string(),
                    secs: wait.as_secs(),
                });
            }
            self.current = url.to_string();
            self.visited.push(url.to_string());
            Ok(())
        }

        async fn html(&mut self) -> Result<String, CrawlError> {
            Ok(self.pages.get(&self.current).cloned().unwrap_or_default())
        }

        async fn link_hrefs(&mut self) -> Result<Vec<String>, CrawlError> {
            Ok(self.seed_links.clone())
        }

        async fn basic_info(&mut self) -> Result<BasicPageInfo, CrawlError> {
            if self.broken_dom.contains(&self.current) {
                return Err(CrawlError::Extraction(ExtractionError::Script(
                    "document unavailable".to_string(),
                )));
            }
            Ok(BasicPageInfo {
                title: format!("Basic {}", self.current),
                texts: vec!["Recovered paragraph text".to_string()],
                images: Vec::new(),
            })
        }

        async fn close(&mut self) -> Result<(), CrawlError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config(max_pages: usize) -> ScraperConfig {
        ScraperConfig {
            seed_url: SEED.to_string(),
            max_pages,
            settle_delay_ms: 0,
            request_delay_ms: 0,
            ..ScraperConfig::default()
        }
    }

    fn site(count: usize) -> FakeFetcher {
        let mut fetcher = FakeFetcher::default();
        for i in 0..count {
            let url = format!("{}/page{}", SEED, i);
            fetcher.pages.insert(
                url.clone(),
                format!(
                    "<html><head><title>Page {i}</title></head><body><p>Content for page number {i}</p></body></html>"
                ),
            );
            fetcher.seed_links.push(url);
        }
        fetcher
    }

    #[tokio::test]
    async fn test_crawl_is_capped() {
        let mut fetcher = site(40);
        let pages = run_crawl(&mut fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 15);
        assert_eq!(pages[0].title, "Page 0");
        assert_eq!(pages[14].url, format!("{}/page14", SEED));
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let mut fetcher = site(40);
        fetcher.failing.insert(format!("{}/page3", SEED));

        let pages = run_crawl(&mut fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 14);
        assert!(pages.iter().all(|p| p.url != format!("{}/page3", SEED)));
        // The crawl carries on after the failure
        assert_eq!(pages.last().unwrap().url, format!("{}/page14", SEED));
    }

    #[tokio::test]
    async fn test_links_deduplicated_and_scoped() {
        let mut fetcher = site(3);
        fetcher.seed_links.push(format!("{}/page1", SEED));
        fetcher.seed_links.push("https://other.com/page".to_string());
        fetcher.seed_links.push(format!("{}/page2#nutrition", SEED));
        fetcher.seed_links.push(format!("{}/page2?lang=fr", SEED));

        let pages = run_crawl(&mut fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 3);
        // Seed plus three distinct pages
        assert_eq!(fetcher.visited.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_markup_uses_dom_fallback() {
        let mut fetcher = site(2);
        fetcher
            .pages
            .insert(format!("{}/page1", SEED), "   ".to_string());

        let pages = run_crawl(&mut fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].title, format!("Basic {}/page1", SEED));
        assert_eq!(pages[1].content, "Recovered paragraph text");
        assert_eq!(pages[1].links, vec![format!("{}/page1", SEED)]);
    }

    #[tokio::test]
    async fn test_page_dropped_when_fallback_fails() {
        let mut fetcher = site(2);
        let broken = format!("{}/page0", SEED);
        fetcher.pages.insert(broken.clone(), String::new());
        fetcher.broken_dom.insert(broken);

        let pages = run_crawl(&mut fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Page 1");
    }

    #[tokio::test]
    async fn test_seed_failure_aborts_and_closes() {
        let mut fetcher = site(5);
        fetcher.failing.insert(SEED.to_string());
        let closed = fetcher.closed.clone();

        let result = crawl_and_close(fetcher, &config(15)).await;

        assert!(matches!(result, Err(CrawlError::NavigationTimeout { .. })));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_browser_closed_after_success() {
        let fetcher = site(2);
        let closed = fetcher.closed.clone();

        let pages = crawl_and_close(fetcher, &config(15)).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
