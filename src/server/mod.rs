//! JSON API over the crawl, the stored content and the chat service

pub mod handlers;

use crate::config::AppConfig;
use crate::crawlers::{SiteScraper, WebDriverScraper};
use crate::services::{ChatService, GraphClient, OpenAiClient};
use crate::storage::{self, ContentStore};
use axum::{
    Router,
    routing::{get, post},
};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub scraper: Arc<dyn SiteScraper>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Build every collaborator from `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, Box<dyn Error>> {
        let store = storage::from_config(&config.storage)?;
        let llm = Arc::new(OpenAiClient::new(config.openai.clone())?);
        let chat = ChatService::new(llm, GraphClient::new(config.graph.clone()));

        Ok(Self {
            store,
            scraper: Arc::new(WebDriverScraper::new(config.scraper.clone())),
            chat: Arc::new(chat),
        })
    }
}

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(handlers::api_index))
        .route("/test", get(handlers::api_test))
        .route(
            "/scrape/start",
            post(handlers::scrape_start).get(handlers::scrape_start),
        )
        .route("/scrape/content", get(handlers::scrape_content))
        .route("/chatbot/query", post(handlers::chatbot_query))
        .route("/graph/load", post(handlers::graph_load))
        .route("/graph/query", post(handlers::graph_query))
        .route("/search/index", post(handlers::search_index))
        .route("/search/query", post(handlers::search_query));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .route("/", get(handlers::welcome))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `addr` until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ::log::info!("Server running on {}", listener.local_addr()?);

    axum::serve(listener, create_routes(state)).await
}
