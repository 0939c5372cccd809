use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Decides which discovered URLs belong to the crawled site
#[derive(Debug)]
pub struct SiteLinkFilter {
    host: String,
    exclude_regexes: Vec<Regex>,
}

impl SiteLinkFilter {
    /// Create a filter scoped to the host of `seed`
    pub fn new(seed: &Url, exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            host: bare_host(seed.host_str().unwrap_or_default()).to_string(),
            exclude_regexes,
        })
    }

    /// Determine if an absolute URL should be queued for crawling
    pub fn should_crawl(&self, href: &str) -> bool {
        // Anchors and parameterised pages are never crawled
        if href.contains('#') || href.contains('?') {
            return false;
        }

        let Ok(url) = Url::parse(href) else {
            return false;
        };

        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        match url.host_str() {
            Some(host) if bare_host(host) == self.host => {}
            _ => return false,
        }

        !self.exclude_regexes.iter().any(|regex| regex.is_match(href))
    }

    /// Whether an href found in page markup points into the site
    pub fn is_site_href(&self, href: &str) -> bool {
        href.starts_with('/') || (!self.host.is_empty() && href.contains(&self.host))
    }

    /// Filter `hrefs` to crawlable site URLs, keeping the first occurrence of each
    pub fn collect(&self, hrefs: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        hrefs
            .iter()
            .filter(|href| self.should_crawl(href))
            .filter(|href| seen.insert(href.as_str()))
            .cloned()
            .collect()
    }
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SiteLinkFilter {
        let seed = Url::parse("https://www.example.com").unwrap();
        SiteLinkFilter::new(&seed, &[]).unwrap()
    }

    #[test]
    fn test_domain_restriction() {
        let filter = filter();
        assert!(filter.should_crawl("https://www.example.com/brands"));
        assert!(filter.should_crawl("https://example.com/brands"));
        assert!(!filter.should_crawl("https://other.com/brands"));
        assert!(!filter.should_crawl("mailto:info@example.com"));
    }

    #[test]
    fn test_fragments_and_queries_rejected() {
        let filter = filter();
        assert!(!filter.should_crawl("https://www.example.com/brands#top"));
        assert!(!filter.should_crawl("https://www.example.com/search?q=cocoa"));
    }

    #[test]
    fn test_exclude_patterns() {
        let seed = Url::parse("https://www.example.com").unwrap();
        let filter = SiteLinkFilter::new(&seed, &[r"\.(pdf|jpg)$".to_string()]).unwrap();
        assert!(!filter.should_crawl("https://www.example.com/menu.pdf"));
        assert!(filter.should_crawl("https://www.example.com/menu"));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let seed = Url::parse("https://www.example.com").unwrap();
        assert!(SiteLinkFilter::new(&seed, &["(".to_string()]).is_err());
    }

    #[test]
    fn test_collect_dedups_in_discovery_order() {
        let hrefs = vec![
            "https://www.example.com/b".to_string(),
            "https://www.example.com/a".to_string(),
            "https://www.example.com/b".to_string(),
            "https://other.com/c".to_string(),
            "https://www.example.com/a#reviews".to_string(),
        ];
        assert_eq!(
            filter().collect(&hrefs),
            vec![
                "https://www.example.com/b".to_string(),
                "https://www.example.com/a".to_string()
            ]
        );
    }

    #[test]
    fn test_is_site_href() {
        let filter = filter();
        assert!(filter.is_site_href("/recipes"));
        assert!(filter.is_site_href("https://www.example.com/recipes"));
        assert!(!filter.is_site_href("https://twitter.com/example"));
        assert!(!filter.is_site_href("recipes"));
    }
}
