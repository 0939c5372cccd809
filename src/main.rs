use clap::Parser;
use site_chat::AppConfig;
use site_chat::crawlers::WebDriverScraper;
use site_chat::server::{self, AppState};
use site_chat::services::{Indexer, OpenAiClient, SearchClient};
use site_chat::storage;
use std::error::Error;
use std::sync::Arc;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let result = match args.command() {
        Command::Serve => run_server(&config).await,
        Command::Crawl => run_crawl(&config).await,
        Command::Index => run_index(&config).await,
    };

    if let Err(e) = result {
        ::log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Defaults, then the optional file, then the environment
fn load_config(args: &Args) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

async fn run_server(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let state = AppState::from_config(config)?;
    server::serve(state, config.server.socket_addr()?).await?;
    Ok(())
}

async fn run_crawl(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    println!("Note: crawling requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        config.scraper.webdriver_url
    );

    let store = storage::from_config(&config.storage)?;
    let scraper = WebDriverScraper::new(config.scraper.clone());

    let start_time = std::time::Instant::now();
    let count = site_chat::crawl_once(&scraper, store.as_ref()).await?;
    ::log::info!(
        "Crawling complete - saved {} pages in {:.2} seconds",
        count,
        start_time.elapsed().as_secs_f64()
    );
    println!("{}", count);
    Ok(())
}

async fn run_index(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let store = storage::from_config(&config.storage)?;
    let search = SearchClient::new(&config.search)?;
    let llm = Arc::new(OpenAiClient::new(config.openai.clone())?);

    let indexer = Indexer::new(store, search, llm, &config.scraper.site_base());
    let count = indexer.index_latest().await?;
    ::log::info!("Indexed {} documents", count);
    Ok(())
}
