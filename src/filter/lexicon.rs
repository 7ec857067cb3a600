//! TermMatcher - Combined banned-term matching
//!
//! Compiles the lexicon once into two complementary engines:
//! - A case-insensitive regex alternation with per-term boundary rules,
//!   longest term first. This is the authoritative matcher used for
//!   testing, stripping, and classification.
//! - An Aho-Corasick automaton (ASCII case-insensitive, boundary-free)
//!   used as the quick-match pre-filter on hot paths.
//!
//! Boundary rule: a term made only of ASCII alphanumerics matches on word
//! boundaries ("cat" never matches inside "category"); a term containing
//! anything else matches as a literal substring ("a.b" matches anywhere).
//!
//! Both engines are stateless per call, so a single matcher is safely
//! reused across thousands of calls.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;
use std::collections::HashSet;

// ==================== TYPE DEFINITIONS ====================

/// Compiled banned-term matcher. Immutable for the process lifetime.
pub struct TermMatcher {
    /// Boundary-aware alternation over all terms, case-insensitive.
    pattern: Regex,
    /// Substring pre-filter, no boundary rules.
    quick: AhoCorasick,
    /// Lowercased terms for exact-phrase membership tests.
    terms_lower: HashSet<String>,
    term_count: usize,
}

// ==================== MAIN IMPLEMENTATION ====================

impl TermMatcher {
    /// Compile a lexicon. Terms are deduplicated by the alternation itself;
    /// longer terms are listed first so they win overlaps.
    pub fn compile(terms: &[String]) -> Result<TermMatcher, String> {
        let mut ordered: Vec<&String> = terms.iter().filter(|t| !t.is_empty()).collect();
        if ordered.is_empty() {
            return Err("No terms to compile. Supply a non-empty lexicon.".to_string());
        }
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));

        let alternates: Vec<String> = ordered
            .iter()
            .map(|term| {
                let escaped = regex::escape(term);
                if term.chars().all(|c| c.is_ascii_alphanumeric()) {
                    format!(r"\b{}\b", escaped)
                } else {
                    escaped
                }
            })
            .collect();

        let pattern = Regex::new(&format!("(?i)(?:{})", alternates.join("|")))
            .map_err(|e| format!("TermMatcher compile error: {}", e))?;

        let quick = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&ordered)
            .map_err(|e| format!("TermMatcher quick-match build error: {}", e))?;

        let terms_lower = ordered.iter().map(|t| t.to_lowercase()).collect();

        Ok(TermMatcher {
            pattern,
            quick,
            term_count: ordered.len(),
            terms_lower,
        })
    }

    /// True iff any term occurs under the boundary rules.
    pub fn test(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Replace every matched span with a single space. Word separation is
    /// preserved for the grammar repair that follows; collapsing is the
    /// caller's job.
    pub fn strip(&self, text: &str) -> String {
        self.pattern.replace_all(text, " ").into_owned()
    }

    /// Cheap existence pre-filter: substring scan without boundary rules or
    /// normalization. May admit candidates `test` later rejects; never
    /// misses one it would accept.
    pub fn quick_match(&self, text: &str) -> bool {
        self.quick.is_match(text)
    }

    /// Exact-phrase membership: is `text` (already trimmed and lowercased
    /// by the caller) precisely one of the lexicon terms?
    pub fn is_term(&self, text: &str) -> bool {
        self.terms_lower.contains(text)
    }

    pub fn term_count(&self) -> usize {
        self.term_count
    }
}

// ==================== TESTS ====================
