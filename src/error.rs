use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures while producing records from the site
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to launch browser session: {0}")]
    BrowserLaunch(String),

    #[error("Navigation to {url} timed out after {secs} seconds")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("Failed to fetch {url}: {message}")]
    FetchFailure { url: String, message: String },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Failures while turning a rendered page into a record
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("DOM evaluation failed: {0}")]
    Script(String),
}

/// Failures of a content store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed with status {status}")]
    Status { operation: String, status: u16 },

    #[error("Malformed blob listing: {0}")]
    Listing(String),

    #[error("Storage configuration missing: {0}")]
    ConfigurationMissing(String),
}

/// Failures of a crawl followed by its persistence
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the chat-completion collaborator
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Chat completion configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat completion returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Chat completion returned no choices")]
    EmptyCompletion,
}

/// Failures of the graph collaborator
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph query failed: {0}")]
    Query(String),
}

/// Failures of the search index collaborator
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed with status {status}")]
    Status { operation: String, status: u16 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn internal(message: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            message: message.to_string(),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
            ApiError::Internal { message, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "message": message, "error": detail }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
