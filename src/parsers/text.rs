use std::collections::{HashMap, HashSet};

/// Minimum length (exclusive) of a content word counted as a keyword
pub const MIN_KEYWORD_CHARS: usize = 3;

/// Collapse every run of whitespace into a single space and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split the `keywords` meta field on commas, dropping blanks
pub fn split_meta_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lower-case `content`, strip punctuation and keep words longer than
/// [`MIN_KEYWORD_CHARS`]
pub fn content_words(content: &str) -> Vec<String> {
    let cleaned = content
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// The `limit` most frequent words; ties keep first-encountered order
pub fn top_words(words: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for word in words {
        let count = counts.entry(word.as_str()).or_insert(0);
        if *count == 0 {
            order.push(word.as_str());
        }
        *count += 1;
    }

    // Stable sort keeps first-encountered order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Concatenate `first` and `second`, dropping exact duplicates
pub fn merge_unique(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second.iter())
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// Keywords for a page: meta keywords first, then the most frequent
/// content words
pub fn derive_keywords(meta_keywords: &str, content: &str, limit: usize) -> Vec<String> {
    let meta = split_meta_keywords(meta_keywords);
    let frequent = top_words(&content_words(content), limit);
    merge_unique(&meta, &frequent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_split_meta_keywords() {
        assert_eq!(
            split_meta_keywords(" chocolate, ,baking , cocoa,"),
            strings(&["chocolate", "baking", "cocoa"])
        );
        assert!(split_meta_keywords("").is_empty());
    }

    #[test]
    fn test_content_words_strip_punctuation_and_short_words() {
        assert_eq!(
            content_words("The Best cookies, ever! Bake them."),
            strings(&["best", "cookies", "ever", "bake", "them"])
        );
    }

    #[test]
    fn test_content_words_drops_non_ascii_letters() {
        assert_eq!(content_words("Café crème"), strings(&["crme"]));
    }

    #[test]
    fn test_top_words_ties_in_first_seen_order() {
        let words = strings(&["milk", "cocoa", "sugar", "cocoa", "milk", "flour"]);
        assert_eq!(
            top_words(&words, 3),
            strings(&["milk", "cocoa", "sugar"])
        );
    }

    #[test]
    fn test_derive_keywords_meta_first_without_duplicates() {
        let keywords = derive_keywords(
            "cocoa, baking, cocoa",
            "cocoa cocoa recipes recipes recipes",
            10,
        );
        assert_eq!(keywords, strings(&["cocoa", "baking", "recipes"]));
    }

    #[test]
    fn test_derive_keywords_bounded() {
        let content = (0..30)
            .map(|i| format!("word{:02}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = derive_keywords("one, two", &content, 10);
        assert_eq!(keywords.len(), 12);
        assert_eq!(keywords[2], "word00");
    }
}
