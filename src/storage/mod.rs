//! Persistence for completed crawls.
//!
//! A crawl is stored under the millisecond timestamp of its creation, both
//! as page records and as a [`CrawlIndex`]. Reads always resolve the crawl
//! with the greatest timestamp.

pub mod blob;
pub mod local;

pub use blob::{BlobConnection, BlobStore};
pub use local::LocalStore;

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::results::{CrawlIndex, PageRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Key prefix of index entries
pub const INDEX_PREFIX: &str = "index_";

/// A backend that persists crawls and returns the latest one
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Persist `records` and their index under the timestamp of `scraped_at`
    async fn save_at(
        &self,
        records: &[PageRecord],
        scraped_at: DateTime<Utc>,
    ) -> Result<CrawlIndex, StoreError>;

    /// Records of the most recent crawl, or none if nothing was saved yet
    async fn try_load_latest(&self) -> Result<Vec<PageRecord>, StoreError>;

    /// Persist `records` as a new crawl taken now
    async fn save(&self, records: &[PageRecord]) -> Result<CrawlIndex, StoreError> {
        self.save_at(records, Utc::now()).await
    }

    /// Like [`ContentStore::try_load_latest`], with read failures reported
    /// as an empty crawl
    async fn load_latest(&self) -> Vec<PageRecord> {
        match self.try_load_latest().await {
            Ok(pages) => pages,
            Err(e) => {
                ::log::error!("Error retrieving scraped content from {}: {}", self.backend(), e);
                Vec::new()
            }
        }
    }
}

/// Pick the backend once: blob storage when a non-blank connection string
/// is set, local files otherwise
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ContentStore>, StoreError> {
    let connection_string = config
        .connection_string
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match connection_string {
        Some(connection_string) => {
            ::log::info!("Using blob storage container: {}", config.container);
            let connection = BlobConnection::parse(connection_string)?;
            Ok(Arc::new(BlobStore::new(connection, &config.container)?))
        }
        None => {
            ::log::info!(
                "No storage connection string provided, saving to {} instead",
                config.data_dir.display()
            );
            Ok(Arc::new(LocalStore::new(&config.data_dir)))
        }
    }
}
