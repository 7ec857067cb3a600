//! Text normalization for exact-phrase comparison
//!
//! Canonicalizes a rendered text fragment so "is this container's entire
//! content exactly a banned term" can be answered by string equality:
//! decode the common named entities, collapse whitespace (including
//! non-breaking space) to single ASCII spaces, trim, lower-case.
//!
//! Never used on the in-place rewrite path, which must preserve original
//! casing and formatting except where explicitly cleaned.

/// Canonical form for equality comparison against lexicon terms.
pub fn normalize(text: &str) -> String {
    collapse_ws(&decode_entities(text)).to_lowercase()
}

/// Collapse every whitespace run to one ASCII space and trim both ends.
/// Case is preserved; used by the classifier's text-extraction hedging.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the five common named entities plus the non-breaking-space
/// entity and codepoint. Replacements run in sequence, so `&amp;lt;`
/// decodes all the way down to `<`.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace('\u{00A0}', " ")
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_decoding() {
        assert_eq!(normalize("a &amp; b"), "a & b");
        assert_eq!(normalize("&lt;tag&gt;"), "<tag>");
        assert_eq!(normalize("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(normalize("it&#39;s"), "it's");
    }

    #[test]
    fn test_double_encoded_ampersand_decodes_fully() {
        assert_eq!(normalize("&amp;lt;"), "<");
    }

    #[test]
    fn test_nbsp_becomes_plain_space() {
        assert_eq!(normalize("a&nbsp;b"), "a b");
        assert_eq!(normalize("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_whitespace_collapse_and_trim() {
        assert_eq!(normalize("  Hello \t\n  World  "), "hello world");
        assert_eq!(normalize("a \u{00A0} b"), "a b");
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(normalize("AAAA"), "aaaa");
    }

    #[test]
    fn test_collapse_ws_preserves_case() {
        assert_eq!(collapse_ws("  Hello   World "), "Hello World");
        assert_eq!(collapse_ws("   "), "");
    }
}
