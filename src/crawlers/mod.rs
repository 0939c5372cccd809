pub mod crawler;
pub mod orchestrator;
pub mod web;

pub use crawler::{PageFetcher, SiteScraper};
pub use orchestrator::{crawl_and_close, run_crawl};
pub use web::{WebDriverFetcher, WebDriverScraper};
