//! Node classification: hide, rewrite, or leave alone
//!
//! Decides what happens to a container whose text matched the lexicon:
//! - `Hide` when removing the banned content would leave the container
//!   empty or content-free (the whole cell IS the banned term);
//! - `Rewrite` when the container matched but keeps real content, so the
//!   per-leaf grammar rewrite handles it instead;
//! - `Skip` when nothing matched or the container was already classified.
//!
//! Classification is conservative: when no rule fires with certainty, the
//! container is left alone and only its text leaves are touched.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::host::{NodeId, TreeHost};

use super::ledger::VisitLedger;
use super::lexicon::TermMatcher;
use super::normalize::{collapse_ws, normalize};
use super::walk::gather_leaf_text;

// ==================== TYPE DEFINITIONS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Suppress the whole container.
    Hide,
    /// Matched, but keeps content; defer to per-text-leaf rewriting.
    Rewrite,
    /// Untouched: no match, or already classified.
    Skip,
}

// ==================== MAIN IMPLEMENTATION ====================

pub struct Classifier {
    /// Tags classified by the cheap leaf-style rules (cells, inline spans).
    leaf_tags: Vec<String>,
    comment_re: Regex,
    tag_re: Regex,
    paren_residue: Regex,
}

impl Classifier {
    pub fn new(leaf_tags: &[String]) -> Self {
        Self {
            leaf_tags: leaf_tags.to_vec(),
            comment_re: Regex::new(r"(?s)<!--.*?-->").unwrap(),
            tag_re: Regex::new(r"<[^>]*>").unwrap(),
            paren_residue: Regex::new(r"^\(\s*\)$").unwrap(),
        }
    }

    /// Classify one element. The element is recorded in the ledger on its
    /// first classification, whatever the outcome, so repeat calls are
    /// constant-time `Skip`s. `Hide` is therefore permanent for this node
    /// identity; there is no un-hide path.
    pub fn classify<H: TreeHost>(
        &self,
        host: &H,
        matcher: &TermMatcher,
        ledger: &mut VisitLedger,
        el: NodeId,
    ) -> Classification {
        if !ledger.mark_element(el) {
            return Classification::Skip;
        }

        let full_text = host.text_content(el);
        if !matcher.test(&full_text) {
            return Classification::Skip;
        }

        let tag = host.tag_name(el).unwrap_or_default();
        if self.leaf_tags.iter().any(|t| *t == tag) {
            return self.leaf_verdict(matcher, &full_text);
        }

        let best = self.best_text(host, el);
        self.general_verdict(matcher, &best, &full_text)
    }

    /// Fast path for leaf-style containers: exact-term cell, or a cell
    /// whose content strips down to nothing.
    pub fn leaf_verdict(&self, matcher: &TermMatcher, text: &str) -> Classification {
        if matcher.is_term(&text.trim().to_lowercase()) {
            return Classification::Hide;
        }
        if matcher.test(text) && self.strips_to_nothing(matcher, text) {
            return Classification::Hide;
        }
        Classification::Rewrite
    }

    /// General path: compare the normalized best extraction and the
    /// normalized raw text against the lexicon, then try strip-to-empty.
    pub fn general_verdict(
        &self,
        matcher: &TermMatcher,
        best_text: &str,
        raw_text: &str,
    ) -> Classification {
        let normalized_best = normalize(best_text);
        if matcher.is_term(&normalized_best) {
            return Classification::Hide;
        }
        if matcher.is_term(&normalize(raw_text)) {
            return Classification::Hide;
        }
        if matcher.test(&normalized_best) && self.strips_to_nothing(matcher, &normalized_best) {
            return Classification::Hide;
        }
        Classification::Rewrite
    }

    /// True when stripping every match and collapsing whitespace leaves
    /// nothing, optionally after discarding an empty parenthesis pair.
    fn strips_to_nothing(&self, matcher: &TermMatcher, text: &str) -> bool {
        let collapsed = collapse_ws(&matcher.strip(text));
        let residue = self.paren_residue.replace(&collapsed, "");
        residue.trim().is_empty()
    }

    /// Best text representation of an element, hedging against host
    /// inconsistencies: direct text content, leaf-by-leaf gathering, and
    /// tag-stripped serialized markup. Longest non-empty wins.
    fn best_text<H: TreeHost>(&self, host: &H, el: NodeId) -> String {
        let direct = collapse_ws(&host.text_content(el));
        let gathered = collapse_ws(&gather_leaf_text(host, el));
        let from_markup = host
            .inner_markup(el)
            .map(|markup| {
                let no_comments = self.comment_re.replace_all(&markup, "");
                collapse_ws(&self.tag_re.replace_all(&no_comments, ""))
            })
            .unwrap_or_default();

        let mut best = String::new();
        for candidate in [direct, gathered, from_markup] {
            if candidate.len() > best.len() {
                best = candidate;
            }
        }
        best
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;

    fn rig(terms: &[&str]) -> (TermMatcher, Classifier, VisitLedger) {
        let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
        let leaf_tags = vec!["td".to_string(), "th".to_string(), "span".to_string()];
        (
            TermMatcher::compile(&terms).unwrap(),
            Classifier::new(&leaf_tags),
            VisitLedger::new(),
        )
    }

    #[test]
    fn test_exact_term_cell_hidden() {
        let (m, c, mut ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let cell = tree.append_element(body, "td");
        tree.append_text(cell, "  AAAA ");

        assert_eq!(c.classify(&tree, &m, &mut ledger, cell), Classification::Hide);
    }

    #[test]
    fn test_cell_with_extra_content_deferred_to_rewrite() {
        let (m, c, mut ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let cell = tree.append_element(body, "td");
        tree.append_text(cell, "aaaa bbbb");

        assert_eq!(
            c.classify(&tree, &m, &mut ledger, cell),
            Classification::Rewrite
        );
        assert!(!tree.is_hidden(cell));
    }

    #[test]
    fn test_no_match_is_skip() {
        let (m, c, mut ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let cell = tree.append_element(body, "td");
        tree.append_text(cell, "clean content");

        assert_eq!(c.classify(&tree, &m, &mut ledger, cell), Classification::Skip);
    }

    #[test]
    fn test_second_classification_is_skip() {
        let (m, c, mut ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let cell = tree.append_element(body, "td");
        tree.append_text(cell, "aaaa");

        assert_eq!(c.classify(&tree, &m, &mut ledger, cell), Classification::Hide);
        assert_eq!(c.classify(&tree, &m, &mut ledger, cell), Classification::Skip);
    }

    #[test]
    fn test_parenthesis_residue_hidden() {
        let (m, c, mut ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let cell = tree.append_element(body, "span");
        tree.append_text(cell, "(aaaa)");

        assert_eq!(c.classify(&tree, &m, &mut ledger, cell), Classification::Hide);
    }

    #[test]
    fn test_general_element_exact_term_hidden() {
        let (m, c, mut ledger) = rig(&["gdfgergerge"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        let inner = tree.append_element(div, "b");
        tree.append_text(inner, " Gdfgergerge ");

        assert_eq!(c.classify(&tree, &m, &mut ledger, div), Classification::Hide);
    }

    #[test]
    fn test_general_element_nbsp_padded_term_hidden() {
        // Non-breaking spaces around the term disappear under
        // normalization, leaving an exact lexicon match.
        let (m, c, mut ledger) = rig(&["gdfgergerge"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        tree.append_text(div, "\u{00A0}Gdfgergerge\u{00A0}");

        assert_eq!(c.classify(&tree, &m, &mut ledger, div), Classification::Hide);
    }

    #[test]
    fn test_general_element_with_content_deferred() {
        let (m, c, mut ledger) = rig(&["gdfgergerge"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        tree.append_text(div, "gdfgergerge and plenty more text");

        assert_eq!(
            c.classify(&tree, &m, &mut ledger, div),
            Classification::Rewrite
        );
    }

    #[test]
    fn test_markup_extraction_strips_comments_and_tags() {
        let (m, c, _ledger) = rig(&["aaaa"]);
        let mut tree = MemoryTree::new();
        let body = tree.init_root("body");
        let div = tree.append_element(body, "div");
        let em = tree.append_element(div, "em");
        tree.append_text(em, "aaaa");
        tree.append_comment(div, "note to self");

        // Comment text must not leak into the extraction: all three
        // methods agree on "aaaa" and the element hides.
        let mut ledger = VisitLedger::new();
        assert_eq!(c.classify(&tree, &m, &mut ledger, div), Classification::Hide);
    }
}
