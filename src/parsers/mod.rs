pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::config::ScraperConfig;
use crate::error::{CrawlError, ExtractionError};
use crate::filter::SiteLinkFilter;
use crate::results::{PageMetadata, PageRecord};
use crate::utils::truncate_chars;
use serde::Deserialize;
use url::Url;

/// Title used when a document has none
pub const UNTITLED: &str = "Untitled Page";

/// Number of frequency-ranked words added to the meta keywords
pub const CONTENT_KEYWORDS: usize = 10;

/// Text fragments with at most this many characters are dropped
pub const MIN_FRAGMENT_CHARS: usize = 5;

const FALLBACK_DESCRIPTION_CHARS: usize = 150;

/// Placeholder content for pages without qualifying text
pub fn placeholder_content(title: &str) -> String {
    format!("Information about {}", title)
}

/// Page data read straight from the live DOM, used when parsing the
/// rendered markup fails
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicPageInfo {
    #[serde(default)]
    pub title: String,

    /// Heading and paragraph texts, already trimmed and length-filtered
    #[serde(default)]
    pub texts: Vec<String>,

    /// Resolved image sources
    #[serde(default)]
    pub images: Vec<String>,
}

/// Turns rendered pages of one site into [`PageRecord`]s
#[derive(Debug)]
pub struct PageExtractor {
    base_url: String,
    filter: SiteLinkFilter,
}

impl PageExtractor {
    pub fn new(base_url: &str, filter: SiteLinkFilter) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            filter,
        }
    }

    /// Build the extractor for the site named by the scraper configuration
    pub fn from_config(config: &ScraperConfig) -> Result<Self, CrawlError> {
        let seed = Url::parse(&config.seed_url).map_err(|e| CrawlError::FetchFailure {
            url: config.seed_url.clone(),
            message: format!("invalid seed URL: {}", e),
        })?;
        let filter = SiteLinkFilter::new(&seed, &config.exclude_patterns).map_err(|e| {
            CrawlError::FetchFailure {
                url: config.seed_url.clone(),
                message: format!("invalid exclude pattern: {}", e),
            }
        })?;
        Ok(Self::new(&config.site_base(), filter))
    }

    pub fn filter(&self) -> &SiteLinkFilter {
        &self.filter
    }

    /// Parse rendered markup into a record
    pub fn extract(&self, html: &str, url: &str) -> Result<PageRecord, ExtractionError> {
        html::extract_page(html, url, &self.base_url, &self.filter)
    }

    /// Build a reduced record from data read directly off the DOM
    pub fn fallback(&self, url: &str, info: BasicPageInfo) -> PageRecord {
        fallback_record(url, info)
    }
}

/// Reduced record for a page whose markup could not be parsed
pub fn fallback_record(url: &str, info: BasicPageInfo) -> PageRecord {
    let title = match info.title.trim() {
        "" => UNTITLED.to_string(),
        title => title.to_string(),
    };

    let content = text::normalize_whitespace(&info.texts.join(" "));
    let description = if content.is_empty() {
        String::new()
    } else {
        format!("{}...", truncate_chars(&content, FALLBACK_DESCRIPTION_CHARS))
    };

    let title_words = title
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();

    PageRecord {
        url: url.to_string(),
        content: if content.is_empty() {
            placeholder_content(&title)
        } else {
            content
        },
        links: vec![url.to_string()],
        images: info.images,
        metadata: PageMetadata {
            keywords: text::merge_unique(&title_words, &[]),
            description,
            categories: Vec::new(),
        },
        title,
    }
}
