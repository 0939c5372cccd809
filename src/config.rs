use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide configuration, built once at start-up and shared by reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Configuration for the site crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Seed URL; its origin is also the base used to normalize links
    #[serde(default = "default_seed_url")]
    pub seed_url: String,

    /// Maximum number of discovered pages to scrape
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_seed_timeout_secs")]
    pub seed_timeout_secs: u64,

    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Pause after navigation so deferred content can render
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause between two page visits
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Regex patterns for discovered URLs to skip
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Where crawls are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob connection string; the local backend is used when absent
    #[serde(default)]
    pub connection_string: Option<String>,

    #[serde(default = "default_container")]
    pub container: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Hosted chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_deployment")]
    pub deployment: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Managed search index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_search_api_version")]
    pub api_version: String,
}

/// Graph database (queries are stubbed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_graph_database")]
    pub database: String,

    #[serde(default = "default_graph_name")]
    pub graph: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_seed_url() -> String {
    "https://www.madewithnestle.ca".to_string()
}

fn default_max_pages() -> usize {
    15
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_seed_timeout_secs() -> u64 {
    60
}

fn default_page_timeout_secs() -> u64 {
    45
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_request_delay_ms() -> u64 {
    1500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_container() -> String {
    "scraped-content".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_deployment() -> String {
    "chatbot-model".to_string()
}

fn default_api_version() -> String {
    "2024-12-01-preview".to_string()
}

fn default_system_prompt() -> String {
    "You are Smartie, a helpful assistant for Made with Nestlé Canada. You provide information about Nestlé products, recipes, and nutritional information. Keep your answers focused on Nestlé products and be friendly and concise.".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_index_name() -> String {
    "products-index".to_string()
}

fn default_search_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_graph_database() -> String {
    "ProductsDB".to_string()
}

fn default_graph_name() -> String {
    "ProductGraph".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            max_pages: default_max_pages(),
            webdriver_url: default_webdriver_url(),
            seed_timeout_secs: default_seed_timeout_secs(),
            page_timeout_secs: default_page_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            request_delay_ms: default_request_delay_ms(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            container: default_container(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: default_deployment(),
            api_version: default_api_version(),
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            index_name: default_index_name(),
            api_version: default_search_api_version(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            database: default_graph_database(),
            graph: default_graph_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Override fields with any non-empty environment variables
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = var("WEBDRIVER_URL") {
            self.scraper.webdriver_url = url;
        }
        if let Some(url) = var("SEED_URL") {
            self.scraper.seed_url = url;
        }
        if let Some(max) = var("MAX_PAGES").and_then(|m| m.parse().ok()) {
            self.scraper.max_pages = max;
        }
        if let Some(dir) = var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(conn) = var("AZURE_STORAGE_CONNECTION_STRING") {
            self.storage.connection_string = Some(conn);
        }
        if let Some(container) = var("AZURE_STORAGE_CONTAINER") {
            self.storage.container = container;
        }
        if let Some(endpoint) = var("AZURE_OPENAI_ENDPOINT") {
            self.openai.endpoint = Some(endpoint);
        }
        if let Some(key) = var("AZURE_OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(deployment) = var("AZURE_OPENAI_DEPLOYMENT") {
            self.openai.deployment = deployment;
        }
        if let Some(version) = var("AZURE_OPENAI_API_VERSION") {
            self.openai.api_version = version;
        }
        if let Some(endpoint) = var("AZURE_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(endpoint);
        }
        if let Some(key) = var("AZURE_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(index) = var("AZURE_SEARCH_INDEX_NAME") {
            self.search.index_name = index;
        }
        if let Some(endpoint) = var("AZURE_COSMOS_GREMLIN_ENDPOINT") {
            self.graph.endpoint = Some(endpoint);
        }
        if let Some(key) = var("AZURE_COSMOS_KEY") {
            self.graph.key = Some(key);
        }
        if let Some(database) = var("AZURE_COSMOS_DATABASE") {
            self.graph.database = database;
        }
        if let Some(graph) = var("AZURE_COSMOS_GRAPH") {
            self.graph.graph = graph;
        }
    }

    /// Log which collaborators are configured, without their secrets
    pub fn log_summary(&self) {
        ::log::info!("Seed URL: {}", self.scraper.seed_url);
        ::log::info!("WebDriver URL: {}", self.scraper.webdriver_url);
        ::log::info!(
            "Blob storage configured: {}",
            yes_no(self.storage.connection_string.is_some())
        );
        ::log::info!(
            "Chat endpoint configured: {}, API key configured: {}",
            yes_no(self.openai.endpoint.is_some()),
            yes_no(self.openai.api_key.is_some())
        );
        ::log::info!("Deployment: {}", self.openai.deployment);
        ::log::info!(
            "Search endpoint configured: {}",
            yes_no(self.search.endpoint.is_some())
        );
        ::log::info!(
            "Graph endpoint configured: {}",
            yes_no(self.graph.endpoint.is_some())
        );
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl ScraperConfig {
    pub fn seed_timeout(&self) -> Duration {
        Duration::from_secs(self.seed_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Scheme and host of the seed URL, without a trailing slash
    pub fn site_base(&self) -> String {
        match url::Url::parse(&self.seed_url) {
            Ok(seed) => seed.origin().ascii_serialization(),
            Err(_) => self.seed_url.trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scraper.max_pages, 15);
        assert_eq!(config.scraper.seed_timeout(), Duration::from_secs(60));
        assert_eq!(config.scraper.page_timeout(), Duration::from_secs(45));
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert!(config.storage.connection_string.is_none());
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "scraper": { "seed_url": "https://example.com/start", "max_pages": 3 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scraper.max_pages, 3);
        assert_eq!(config.scraper.webdriver_url, "http://localhost:4444");
        assert_eq!(config.openai.api_version, "2024-12-01-preview");
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "8081"),
            ("MAX_PAGES", "4"),
            ("AZURE_OPENAI_ENDPOINT", "https://llm.example.com/"),
            ("AZURE_OPENAI_API_KEY", ""),
            ("AZURE_STORAGE_CONNECTION_STRING", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.scraper.max_pages, 4);
        assert_eq!(
            config.openai.endpoint.as_deref(),
            Some("https://llm.example.com/")
        );
        assert!(config.openai.api_key.is_none());
        assert!(config.storage.connection_string.is_none());
    }

    #[test]
    fn test_site_base_is_origin() {
        let config = ScraperConfig {
            seed_url: "https://www.example.com/en/home?x=1".to_string(),
            ..ScraperConfig::default()
        };
        assert_eq!(config.site_base(), "https://www.example.com");
    }
}
