use crate::error::StoreError;
use crate::results::{CrawlIndex, PageRecord};
use crate::storage::{ContentStore, INDEX_PREFIX};
use crate::utils::timestamp_from_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// File name prefix of a crawl's records
pub const CONTENT_PREFIX: &str = "scraped_content_";

/// Stores each crawl as `scraped_content_<ts>.json` plus `index_<ts>.json`
/// in one directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Newest content file in the data directory, if any
    async fn latest_content_file(&self) -> Result<Option<PathBuf>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.data_dir).await?;
        let mut latest: Option<(i64, PathBuf)> = None;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(ts) = timestamp_from_key(&name.to_string_lossy(), CONTENT_PREFIX) else {
                continue;
            };
            if latest.as_ref().is_none_or(|(best, _)| ts > *best) {
                latest = Some((ts, entry.path()));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn save_at(
        &self,
        records: &[PageRecord],
        scraped_at: DateTime<Utc>,
    ) -> Result<CrawlIndex, StoreError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let ts = scraped_at.timestamp_millis();
        let content_path = self.data_dir.join(format!("{}{}.json", CONTENT_PREFIX, ts));
        tokio::fs::write(&content_path, serde_json::to_vec_pretty(records)?).await?;
        ::log::info!("Scraped content saved to {}", content_path.display());

        let index = CrawlIndex::from_records(records, scraped_at);
        let index_path = self.data_dir.join(format!("{}{}.json", INDEX_PREFIX, ts));
        tokio::fs::write(&index_path, serde_json::to_vec_pretty(&index)?).await?;
        ::log::info!("Index saved to {}", index_path.display());

        Ok(index)
    }

    async fn try_load_latest(&self) -> Result<Vec<PageRecord>, StoreError> {
        ::log::info!("Retrieving content from local files...");

        if !tokio::fs::try_exists(&self.data_dir).await? {
            ::log::info!("Data directory does not exist");
            return Ok(Vec::new());
        }

        let Some(path) = self.latest_content_file().await? else {
            ::log::info!("No scraped content files found");
            return Ok(Vec::new());
        };

        ::log::info!("Reading content from {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        let pages: Vec<PageRecord> = serde_json::from_slice(&bytes)?;
        ::log::info!("Found {} pages in the file", pages.len());
        Ok(pages)
    }
}
