//! Grammar-preserving rewrite of matched text leaves
//!
//! Given a text fragment containing banned spans, produces the cleaned
//! fragment: spans stripped, spacing repaired, sentence capitalization
//! restored, punctuation re-spaced without corrupting compact tokens like
//! email addresses. Pure string transforms, applied in a fixed order.
//!
//! The rewrite is only reported when it differs from the original; a
//! no-op write would retrigger the host's mutation notifications and feed
//! the engine its own output.

use regex::{Captures, Regex};

use super::lexicon::TermMatcher;

// ==================== TYPE DEFINITIONS ====================

/// Previous-sibling context for the leading-space policy.
///
/// A fragment with any preceding sibling must keep one leading space so
/// its first word cannot fuse with the previous fragment, unless that
/// sibling is a text leaf that already ends in whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingContext {
    pub has_preceding_sibling: bool,
    pub preceding_text_ends_with_space: bool,
}

impl SiblingContext {
    /// Context for a leaf with no preceding sibling.
    pub fn none() -> Self {
        Self::default()
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// Grammar repair pipeline with precompiled patterns.
pub struct Rewriter {
    multi_space: Regex,
    sentence_cap: Regex,
    space_before_punct: Regex,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter {
    pub fn new() -> Self {
        Self {
            multi_space: Regex::new(r"\s{2,}").unwrap(),
            // First letter after sentence-ending punctuation + whitespace.
            sentence_cap: Regex::new(r"([.!?]\s+)([a-z])").unwrap(),
            space_before_punct: Regex::new(r"\s+([,.!?;:])").unwrap(),
        }
    }

    /// Run the full pipeline. Returns `Some(clean)` when the result
    /// differs from `original`, `None` for a no-op.
    pub fn rewrite(
        &self,
        matcher: &TermMatcher,
        original: &str,
        ctx: SiblingContext,
    ) -> Option<String> {
        if !matcher.test(original) {
            return None;
        }

        // 1. Strip matches, one space per span.
        let mut text = matcher.strip(original);

        // 2. Collapse runs of two or more spaces.
        text = self.multi_space.replace_all(&text, " ").into_owned();

        // 3. Leading-space policy from sibling context.
        let needs_leading_space = ctx.has_preceding_sibling && !ctx.preceding_text_ends_with_space;
        text = if needs_leading_space {
            format!(" {}", text.trim_start())
        } else {
            text.trim_start().to_string()
        };

        // 4. Restore sentence capitalization.
        text = self
            .sentence_cap
            .replace_all(&text, |caps: &Captures| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned();
        text = capitalize_first(text);

        // 5. Drop whitespace before punctuation.
        text = self
            .space_before_punct
            .replace_all(&text, "${1}")
            .into_owned();

        // 6. Re-space after punctuation, preserving compact tokens.
        text = space_after_punctuation(&text);

        // 7. Trim trailing whitespace.
        let text = text.trim_end();

        if text != original {
            Some(text.to_string())
        } else {
            None
        }
    }
}

/// Upper-case the first character when it is an ASCII lower-case letter.
fn capitalize_first(text: String) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut out = String::with_capacity(text.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        _ => text,
    }
}

/// Insert one space after `, . ! ? ; :` when a non-space character
/// follows, unless the surrounding characters look like an email-style
/// token: alphanumeric immediately before the mark and alphanumeric,
/// `@`, or `.` immediately after. No space is ever inserted before `@`.
fn space_after_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if !matches!(c, ',' | '.' | '!' | '?' | ';' | ':') {
            continue;
        }
        let Some(&next) = chars.get(i + 1) else {
            continue;
        };
        if next.is_whitespace() || next == '@' {
            continue;
        }
        let prev_alnum = i > 0 && chars[i - 1].is_ascii_alphanumeric();
        let next_compact = next.is_ascii_alphanumeric() || next == '.';
        if !(prev_alnum && next_compact) {
            out.push(' ');
        }
    }
    out
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn rig(terms: &[&str]) -> (TermMatcher, Rewriter) {
        let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
        (TermMatcher::compile(&terms).unwrap(), Rewriter::new())
    }

    #[test]
    fn test_basic_strip_and_collapse() {
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(&m, "Hello gdfgergerge my friend.", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Hello my friend."));
    }

    #[test]
    fn test_no_op_returns_none() {
        let (m, r) = rig(&["cat"]);
        assert!(r.rewrite(&m, "nothing banned here", SiblingContext::none()).is_none());
    }

    #[test]
    fn test_leading_space_forced_when_preceding_sibling_abuts() {
        let (m, r) = rig(&["cat"]);
        let ctx = SiblingContext {
            has_preceding_sibling: true,
            preceding_text_ends_with_space: false,
        };
        let out = r.rewrite(&m, "cat nap time", ctx);
        assert_eq!(out.as_deref(), Some(" nap time"));
    }

    #[test]
    fn test_leading_space_stripped_when_preceding_text_ends_in_space() {
        let (m, r) = rig(&["cat"]);
        let ctx = SiblingContext {
            has_preceding_sibling: true,
            preceding_text_ends_with_space: true,
        };
        let out = r.rewrite(&m, "cat nap time", ctx);
        assert_eq!(out.as_deref(), Some("Nap time"));
    }

    #[test]
    fn test_sentence_capitalization_after_strip() {
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(
            &m,
            "He left. gdfgergerge then we spoke. all good.",
            SiblingContext::none(),
        );
        // The letter after each sentence boundary is re-capitalized.
        assert_eq!(out.as_deref(), Some("He left. Then we spoke. All good."));
    }

    #[test]
    fn test_first_character_capitalized() {
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(&m, "gdfgergerge likes tea", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Likes tea"));
    }

    #[test]
    fn test_space_removed_before_punctuation() {
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(&m, "we met gdfgergerge , then left", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("We met, then left"));
    }

    #[test]
    fn test_space_inserted_after_punctuation() {
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(&m, "yes gdfgergerge !(see notes)", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Yes! (see notes)"));
    }

    #[test]
    fn test_compact_word_punct_word_token_left_alone() {
        // Alphanumeric on both sides of the mark reads as a compact token
        // (version strings, hostnames, emails), so no space is inserted.
        let (m, r) = rig(&["gdfgergerge"]);
        let out = r.rewrite(&m, "wait gdfgergerge ,hold on", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Wait,hold on"));
    }

    #[test]
    fn test_email_address_survives_punctuation_spacing() {
        let (m, r) = rig(&["me"]);
        let out = r.rewrite(&m, "Contact me at a@b.com please", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Contact at a@b.com please"));
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let (m, r) = rig(&["cat"]);
        let out = r.rewrite(&m, "saw a cat", SiblingContext::none());
        assert_eq!(out.as_deref(), Some("Saw a"));
    }

    #[test]
    fn test_rewrite_of_clean_output_is_stable() {
        let (m, r) = rig(&["gdfgergerge"]);
        let first = r
            .rewrite(&m, "Hello gdfgergerge my friend.", SiblingContext::none())
            .unwrap();
        // Running the pipeline over its own output changes nothing.
        assert!(r.rewrite(&m, &first, SiblingContext::none()).is_none());
    }

    #[test]
    fn test_no_uncapitalized_sentence_starts_remain() {
        let (m, r) = rig(&["bad"]);
        let out = r
            .rewrite(&m, "bad start. second one! third? yes.", SiblingContext::none())
            .unwrap();
        for window in out.as_bytes().windows(3) {
            if matches!(window[0], b'.' | b'!' | b'?') && window[1] == b' ' {
                assert!(
                    !window[2].is_ascii_lowercase(),
                    "uncapitalized sentence start in {:?}",
                    out
                );
            }
        }
    }
}
