use crate::error::SearchError;
use crate::results::PageRecord;
use crate::services::openai::OpenAiClient;
use crate::services::search::{SearchClient, SearchDocument};
use crate::storage::ContentStore;
use crate::utils::document_id;
use std::sync::Arc;

/// Category used when a page has no navigation labels
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Pushes the latest crawl into the search index
pub struct Indexer {
    store: Arc<dyn ContentStore>,
    search: SearchClient,
    llm: Arc<OpenAiClient>,
    base_url: String,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn ContentStore>,
        search: SearchClient,
        llm: Arc<OpenAiClient>,
        base_url: &str,
    ) -> Self {
        Self {
            store,
            search,
            llm,
            base_url: base_url.to_string(),
        }
    }

    /// Returns the number of documents uploaded
    pub async fn index_latest(&self) -> Result<usize, SearchError> {
        ::log::info!("Starting to index content...");

        let pages = self.store.try_load_latest().await?;
        if pages.is_empty() {
            ::log::info!("No pages found. Please scrape the website first.");
            return Ok(0);
        }
        ::log::info!("Found {} pages to index", pages.len());

        let documents = pages
            .iter()
            .map(|page| {
                let vector = self.llm.embed(&embedding_text(page));
                ::log::debug!("Prepared document for: {}", page.title);
                to_document(page, &self.base_url, vector)
            })
            .collect::<Vec<_>>();

        self.search.ensure_index().await?;
        self.search.upload_documents(&documents).await?;

        ::log::info!("Indexing completed successfully");
        Ok(documents.len())
    }
}

/// Text embedded for a page
pub fn embedding_text(page: &PageRecord) -> String {
    format!(
        "{} {} {} {}",
        page.title,
        page.content,
        page.metadata.description,
        page.metadata.keywords.join(" ")
    )
}

pub fn to_document(page: &PageRecord, base_url: &str, vector: Vec<f32>) -> SearchDocument {
    SearchDocument {
        id: document_id(&page.url, base_url),
        url: page.url.clone(),
        title: page.title.clone(),
        content: page.content.clone(),
        category: page
            .metadata
            .categories
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
        keywords: page.metadata.keywords.clone(),
        description: page.metadata.description.clone(),
        vector_field: vector,
    }
}
