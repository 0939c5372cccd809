use crate::error::ExtractionError;
use crate::filter::SiteLinkFilter;
use crate::parsers::{CONTENT_KEYWORDS, MIN_FRAGMENT_CHARS, UNTITLED, placeholder_content, text};
use crate::results::{PageMetadata, PageRecord};
use crate::utils::normalize_url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Elements whose text makes up the page content
const CONTENT_SELECTOR: &str =
    "p, h1, h2, h3, h4, h5, h6, li, .product-description, .content-area";

/// Breadcrumb and navigation labels
const CATEGORY_SELECTOR: &str = ".breadcrumb li, .nav-item, .breadcrumb-item";

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("{}: {}", css, e)))
}

/// Text of an element with `<script>` and `<style>` contents left out
pub fn element_text(element: ElementRef) -> String {
    element
        .descendants()
        .filter_map(|node| node.value().as_text().map(|t| (node, t)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style"))
            })
        })
        .map(|(_, t)| t.to_string())
        .collect()
}

/// Parses a rendered page into a [`PageRecord`]
pub fn extract_page(
    html: &str,
    url: &str,
    base_url: &str,
    filter: &SiteLinkFilter,
) -> Result<PageRecord, ExtractionError> {
    if html.trim().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    let doc = Html::parse_document(html);

    let title = doc
        .select(&selector("title")?)
        .next()
        .map(|e| element_text(e).trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    ::log::info!("- Page title: {}", title);

    let description = meta_content(&doc, "description")?;
    let meta_keywords = meta_content(&doc, "keywords")?;

    let mut seen = HashSet::new();
    let categories = doc
        .select(&selector(CATEGORY_SELECTOR)?)
        .map(|e| element_text(e).trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect::<Vec<_>>();

    let fragments = doc
        .select(&selector(CONTENT_SELECTOR)?)
        .map(|e| element_text(e).trim().to_string())
        .filter(|t| t.chars().count() > MIN_FRAGMENT_CHARS)
        .collect::<Vec<_>>();
    let content = text::normalize_whitespace(&fragments.join(" "));

    let links = doc
        .select(&selector("a[href]")?)
        .filter_map(|e| e.value().attr("href"))
        .filter(|href| filter.is_site_href(href))
        .map(|href| normalize_url(href, base_url))
        .collect::<Vec<_>>();

    let images = doc
        .select(&selector("img[src]")?)
        .filter_map(|e| e.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(|src| normalize_url(src, base_url))
        .collect::<Vec<_>>();

    ::log::debug!(
        "HTML extractor found {} links and {} images in {}",
        links.len(),
        images.len(),
        url
    );

    let keywords = text::derive_keywords(&meta_keywords, &content, CONTENT_KEYWORDS);

    Ok(PageRecord {
        url: url.to_string(),
        content: if content.is_empty() {
            placeholder_content(&title)
        } else {
            content
        },
        title,
        links,
        images,
        metadata: PageMetadata {
            keywords,
            description,
            categories,
        },
    })
}

/// `content` attribute of `<meta name="{name}">`, or an empty string
fn meta_content(doc: &Html, name: &str) -> Result<String, ExtractionError> {
    let meta = selector(&format!("meta[name=\"{}\"]", name))?;
    Ok(doc
        .select(&meta)
        .next()
        .and_then(|e| e.value().attr("content"))
        .unwrap_or_default()
        .to_string())
}
