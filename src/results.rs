use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One scraped page, as produced by the extractor and persisted by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was loaded from
    pub url: String,

    /// Page title, or a default label when the document has none
    pub title: String,

    /// Whitespace-normalized body text
    pub content: String,

    /// Same-site links found on the page, normalized against the site base
    pub links: Vec<String>,

    /// Image sources, normalized against the site base
    pub images: Vec<String>,

    /// Meta tags, derived keywords and navigation labels
    pub metadata: PageMetadata,
}

/// Descriptive data attached to a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub keywords: Vec<String>,
    pub description: String,
    pub categories: Vec<String>,
}

/// `{url, title}` summary of one record inside a [`CrawlIndex`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
}

/// Summary written next to every persisted crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlIndex {
    /// ISO-8601 creation time of the crawl
    pub scrape_time: String,
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
}

impl CrawlIndex {
    /// Build the index for `records`, keeping their order
    pub fn from_records(records: &[PageRecord], scraped_at: DateTime<Utc>) -> Self {
        let pages = records
            .iter()
            .map(|page| PageSummary {
                url: page.url.clone(),
                title: page.title.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            scrape_time: scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            page_count: pages.len(),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(url: &str, title: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: title.to_string(),
            content: format!("Information about {}", title),
            links: Vec::new(),
            images: Vec::new(),
            metadata: PageMetadata::default(),
        }
    }

    #[test]
    fn test_index_matches_records() {
        let records = vec![
            record("https://example.com/a", "A"),
            record("https://example.com/b", "B"),
        ];
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let index = CrawlIndex::from_records(&records, at);

        assert_eq!(index.page_count, 2);
        assert_eq!(index.pages.len(), index.page_count);
        assert_eq!(index.pages[1].url, "https://example.com/b");
        assert_eq!(index.scrape_time, "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_index_serializes_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let index = CrawlIndex::from_records(&[record("https://example.com/", "Home")], at);
        let json = serde_json::to_value(&index).unwrap();

        assert_eq!(json["pageCount"], 1);
        assert_eq!(json["scrapeTime"], "2024-05-01T12:00:00.000Z");
        assert_eq!(json["pages"][0]["title"], "Home");
    }
}
