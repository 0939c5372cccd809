use crate::error::{ApiError, ApiResult};
use crate::results::PageRecord;
use crate::server::AppState;
use crate::services::ChatResponse;
use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const QUERY_REQUIRED: &str = "Query parameter is required";

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    query: Option<String>,
}

/// `query` from a JSON body; anything else counts as missing
fn required_query(body: &Bytes) -> ApiResult<String> {
    serde_json::from_slice::<QueryBody>(body)
        .ok()
        .and_then(|b| b.query)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest(QUERY_REQUIRED.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub message: String,
    pub page_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub success: bool,
    pub message: String,
    pub page_count: usize,
    pub content: Vec<PageRecord>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: ChatResponse,
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Site Chat API - Welcome!" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

pub async fn api_index() -> Json<Value> {
    Json(json!({
        "message": "Site Chat API - Available endpoints:",
        "endpoints": [
            "/api/test",
            "/api/scrape/content",
            "/api/scrape/start",
            "/api/chatbot/query",
            "/api/graph/load",
            "/api/graph/query",
            "/api/search/index",
            "/api/search/query",
        ]
    }))
}

pub async fn api_test() -> Json<Value> {
    Json(json!({ "message": "API is working" }))
}

/// Crawl the site and persist the result
pub async fn scrape_start(State(state): State<AppState>) -> ApiResult<Json<ScrapeResponse>> {
    ::log::info!("Starting website scraping process...");

    let page_count = crate::crawl_once(state.scraper.as_ref(), state.store.as_ref())
        .await
        .map_err(|e| {
            ::log::error!("Error scraping website: {}", e);
            ApiError::internal("Error scraping website", e)
        })?;

    let message = if page_count == 0 {
        "No pages were scraped"
    } else {
        "Website scraped successfully"
    };

    Ok(Json(ScrapeResponse {
        success: true,
        message: message.to_string(),
        page_count,
    }))
}

/// Latest persisted crawl
pub async fn scrape_content(State(state): State<AppState>) -> Json<ContentResponse> {
    let content = state.store.load_latest().await;

    let message = if content.is_empty() {
        "No content found. Try scraping the website first."
    } else {
        "Content retrieved successfully"
    };

    Json(ContentResponse {
        success: true,
        message: message.to_string(),
        page_count: content.len(),
        content,
    })
}

pub async fn chatbot_query(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ChatReply>> {
    let query = required_query(&body)?;
    let response = state.chat.answer(&query).await;

    Ok(Json(ChatReply {
        success: true,
        response,
    }))
}

pub async fn graph_load() -> Json<Value> {
    placeholder("Graph load functionality is being implemented")
}

pub async fn graph_query() -> Json<Value> {
    placeholder("Graph query functionality is being implemented")
}

pub async fn search_index() -> Json<Value> {
    ::log::info!("Starting to index content...");
    placeholder("Content indexing functionality is being implemented")
}

pub async fn search_query(body: Bytes) -> ApiResult<Json<Value>> {
    let query = required_query(&body)?;
    Ok(Json(json!({
        "success": true,
        "message": "Search functionality is being implemented",
        "query": query,
    })))
}

fn placeholder(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    ::log::info!("[404] Route not found: {}", uri);
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": format!("Route {} not found", uri) })),
    )
}
