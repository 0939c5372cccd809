use crate::config::ScraperConfig;
use crate::crawlers::crawler::{PageFetcher, SiteScraper};
use crate::crawlers::orchestrator;
use crate::error::{CrawlError, ExtractionError};
use crate::parsers::{BasicPageInfo, MIN_FRAGMENT_CHARS};
use crate::results::PageRecord;
use async_trait::async_trait;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::time::timeout;

/// Extra time the local guard gives the browser to report its own page-load timeout
const NAVIGATION_GRACE: Duration = Duration::from_secs(5);

/// Collects the resolved `href` of every anchor
const LINKS_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll('a'))
    .map(function (a) { return a.href; })
    .filter(function (href) { return !!href; });
"#;

/// Reads title, heading/paragraph texts and images straight from the DOM
const BASIC_INFO_SCRIPT: &str = r#"
var minChars = arguments[0];
var texts = [];
document.querySelectorAll('p, h1, h2, h3, h4, h5, h6').forEach(function (el) {
    var text = (el.textContent || '').trim();
    if (text.length > minChars) { texts.push(text); }
});
var images = [];
document.querySelectorAll('img').forEach(function (img) {
    if (img.src) { images.push(img.src); }
});
return { title: document.title || '', texts: texts, images: images };
"#;

/// Browser page driven through a WebDriver server
pub struct WebDriverFetcher {
    client: Option<Client>,
}

impl WebDriverFetcher {
    /// Start a fresh headless browser session
    pub async fn launch(config: &ScraperConfig) -> Result<Self, CrawlError> {
        ::log::info!("Launching browser via WebDriver at {}", config.webdriver_url);

        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(config))
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| {
                ::log::error!(
                    "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
                );
                CrawlError::BrowserLaunch(format!("{}: {}", config.webdriver_url, e))
            })?;

        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Client, CrawlError> {
        self.client
            .as_ref()
            .ok_or_else(|| CrawlError::BrowserLaunch("browser session already closed".to_string()))
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, CrawlError> {
        self.client()?
            .execute(script, args)
            .await
            .map_err(|e| CrawlError::Extraction(ExtractionError::Script(e.to_string())))
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    /// Navigate with the browser's page-load timeout set to `wait`, so a
    /// slow page is abandoned by the browser and cannot hold up the next
    /// navigation on this session
    async fn open(&mut self, url: &str, wait: Duration) -> Result<(), CrawlError> {
        let client = self.client()?;
        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(wait), None))
            .await
            .map_err(|e| handle_navigation_error(e, "setting page load timeout for", url))?;

        let timed_out = || CrawlError::NavigationTimeout {
            url: url.to_string(),
            secs: wait.as_secs(),
        };
        match timeout(wait + NAVIGATION_GRACE, client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_timeout() => Err(timed_out()),
            Ok(Err(e)) => Err(handle_navigation_error(e, "accessing", url)),
            Err(_) => {
                ::log::warn!("Browser did not report a page load timeout for {}", url);
                Err(timed_out())
            }
        }
    }

    async fn html(&mut self) -> Result<String, CrawlError> {
        let client = self.client()?;
        let url = client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();
        client
            .source()
            .await
            .map_err(|e| handle_navigation_error(e, "getting source for", &url))
    }

    async fn link_hrefs(&mut self) -> Result<Vec<String>, CrawlError> {
        let value = self.run_script(LINKS_SCRIPT, Vec::new()).await?;
        serde_json::from_value(value)
            .map_err(|e| CrawlError::Extraction(ExtractionError::Script(e.to_string())))
    }

    async fn basic_info(&mut self) -> Result<BasicPageInfo, CrawlError> {
        let value = self
            .run_script(BASIC_INFO_SCRIPT, vec![json!(MIN_FRAGMENT_CHARS)])
            .await?;
        serde_json::from_value(value)
            .map_err(|e| CrawlError::Extraction(ExtractionError::Script(e.to_string())))
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| CrawlError::BrowserLaunch(format!("failed to close session: {}", e)))?;
        }
        Ok(())
    }
}

/// Crawls the configured site with a new WebDriver session per crawl
pub struct WebDriverScraper {
    config: ScraperConfig,
}

impl WebDriverScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SiteScraper for WebDriverScraper {
    async fn scrape(&self) -> Result<Vec<PageRecord>, CrawlError> {
        let fetcher = WebDriverFetcher::launch(&self.config).await?;
        orchestrator::crawl_and_close(fetcher, &self.config).await
    }
}

/// Chrome capabilities for a headless session that renders dynamic pages
pub fn chrome_capabilities(config: &ScraperConfig) -> Map<String, Value> {
    let languages = accept_languages(&config.accept_language);
    let primary = languages.split(',').next().unwrap_or("en-US").to_string();

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));
    caps.insert(
        "timeouts".to_string(),
        json!({ "pageLoad": config.page_timeout().as_millis() as u64 }),
    );
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless=new",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-web-security",
                "--disable-features=IsolateOrigins,site-per-process",
                format!("--user-agent={}", config.user_agent),
                format!("--lang={}", primary),
            ],
            "prefs": {
                "intl.accept_languages": languages,
                "profile.managed_default_content_settings.javascript": 1,
            },
        }),
    );
    caps
}

/// `en-US,en;q=0.9` -> `en-US,en`
fn accept_languages(header: &str) -> String {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Maps a WebDriver command failure to a per-page fetch failure
fn handle_navigation_error(
    error: fantoccini::error::CmdError,
    context: &str,
    url: &str,
) -> CrawlError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost browser session while {} {}", context, url);
    }
    CrawlError::FetchFailure {
        url: url.to_string(),
        message: format!("{} failed: {}", context, error),
    }
}
