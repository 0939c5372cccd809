use crate::error::CrawlError;
use crate::parsers::BasicPageInfo;
use crate::results::PageRecord;
use async_trait::async_trait;
use std::time::Duration;

/// A single browser page that the crawl drives one URL at a time
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigate to `url`, giving up after `wait`
    async fn open(&mut self, url: &str, wait: Duration) -> Result<(), CrawlError>;

    /// Rendered markup of the current page
    async fn html(&mut self) -> Result<String, CrawlError>;

    /// Resolved `href` of every anchor on the current page
    async fn link_hrefs(&mut self) -> Result<Vec<String>, CrawlError>;

    /// Title, heading/paragraph texts and image sources read off the live DOM
    async fn basic_info(&mut self) -> Result<BasicPageInfo, CrawlError>;

    /// Release the browser session
    async fn close(&mut self) -> Result<(), CrawlError>;
}

/// Something that produces one complete crawl of the configured site
#[async_trait]
pub trait SiteScraper: Send + Sync {
    async fn scrape(&self) -> Result<Vec<PageRecord>, CrawlError>;
}
