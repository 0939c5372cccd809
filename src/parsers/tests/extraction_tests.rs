use crate::error::ExtractionError;
use crate::filter::SiteLinkFilter;
use crate::parsers::{PageExtractor, placeholder_content};
use url::Url;

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.example.com";

    fn extractor() -> PageExtractor {
        let seed = Url::parse(BASE).unwrap();
        PageExtractor::new(BASE, SiteLinkFilter::new(&seed, &[]).unwrap())
    }

    const PRODUCT_PAGE: &str = r#"
        <html>
          <head>
            <title>  Chocolate Chip Cookies </title>
            <meta name="description" content="Classic cookie recipe">
            <meta name="keywords" content="cookies, baking, cookies">
            <style>.hidden { display: none; }</style>
          </head>
          <body>
            <nav><span class="breadcrumb-item">Home</span><span class="breadcrumb-item">Recipes</span><span class="breadcrumb-item">Home</span></nav>
            <h1>Chocolate Chip Cookies</h1>
            <p>Short</p>
            <p>Bake the cookies until golden. <script>track("cookies cookies cookies")</script></p>
            <div class="product-description">Made with real chocolate chips.</div>
            <a href="/recipes/brownies">Brownies</a>
            <a href="https://www.example.com/brands">Brands</a>
            <a href="https://twitter.com/example">Twitter</a>
            <a href="/recipes/brownies">Brownies again</a>
            <img src="/images/cookie.png">
            <img src="https://cdn.example.net/banner.jpg">
            <img src="assets/logo.svg">
          </body>
        </html>
    "#;

    #[test]
    fn test_title_and_meta() {
        let page = extractor()
            .extract(PRODUCT_PAGE, "https://www.example.com/recipes/cookies")
            .unwrap();

        assert_eq!(page.url, "https://www.example.com/recipes/cookies");
        assert_eq!(page.title, "Chocolate Chip Cookies");
        assert_eq!(page.metadata.description, "Classic cookie recipe");
    }

    #[test]
    fn test_content_skips_short_fragments_and_scripts() {
        let page = extractor()
            .extract(PRODUCT_PAGE, "https://www.example.com/recipes/cookies")
            .unwrap();

        assert_eq!(
            page.content,
            "Chocolate Chip Cookies Bake the cookies until golden. Made with real chocolate chips."
        );
        assert!(!page.content.contains("track"));
        assert!(!page.content.contains("Short"));
    }

    #[test]
    fn test_links_and_images_normalized() {
        let page = extractor()
            .extract(PRODUCT_PAGE, "https://www.example.com/recipes/cookies")
            .unwrap();

        assert_eq!(
            page.links,
            vec![
                "https://www.example.com/recipes/brownies",
                "https://www.example.com/brands",
                "https://www.example.com/recipes/brownies",
            ]
        );
        assert_eq!(
            page.images,
            vec![
                "https://www.example.com/images/cookie.png",
                "https://cdn.example.net/banner.jpg",
                "https://www.example.com/assets/logo.svg",
            ]
        );
    }

    #[test]
    fn test_categories_dedup_in_order() {
        let page = extractor()
            .extract(PRODUCT_PAGE, "https://www.example.com/recipes/cookies")
            .unwrap();

        assert_eq!(page.metadata.categories, vec!["Home", "Recipes"]);
    }

    #[test]
    fn test_keywords_meta_first_then_frequency() {
        let page = extractor()
            .extract(PRODUCT_PAGE, "https://www.example.com/recipes/cookies")
            .unwrap();
        let keywords = &page.metadata.keywords;

        assert_eq!(keywords[0], "cookies");
        assert_eq!(keywords[1], "baking");
        // "chocolate" appears twice and outranks single words
        assert_eq!(keywords[2], "chocolate");
        assert!(keywords.len() <= 2 + 10);

        let mut unique = keywords.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), keywords.len());
    }

    #[test]
    fn test_placeholder_content_when_no_text() {
        let html = "<html><head><title>Empty</title></head><body><p>tiny</p><div>ignored div</div></body></html>";
        let page = extractor().extract(html, "https://www.example.com/empty").unwrap();

        assert_eq!(page.content, "Information about Empty");
        assert_eq!(page.content, placeholder_content(&page.title));
    }

    #[test]
    fn test_untitled_default() {
        let html = "<html><body><p>Some paragraph text here.</p></body></html>";
        let page = extractor().extract(html, "https://www.example.com/x").unwrap();

        assert_eq!(page.title, "Untitled Page");
        assert_eq!(page.content, "Some paragraph text here.");
        assert_eq!(page.metadata.description, "");
        assert!(page.metadata.categories.is_empty());
    }

    #[test]
    fn test_blank_document_is_error() {
        let result = extractor().extract("  \n ", "https://www.example.com/blank");
        assert!(matches!(result, Err(ExtractionError::EmptyDocument)));
    }

    #[test]
    fn test_whitespace_collapsed() {
        let html = "<html><body><h2>  Nutrition\n\n   facts   </h2><li>Per 100g   serving</li></body></html>";
        let page = extractor().extract(html, "https://www.example.com/n").unwrap();

        assert_eq!(page.content, "Nutrition facts Per 100g serving");
    }
}
