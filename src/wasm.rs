//! WASM facade
//!
//! Exposes the text-level scrubbing operations to JavaScript, so a
//! content script that owns real DOM access can delegate every matching,
//! rewriting, and hide/skip decision to the engine while doing the node
//! manipulation itself.
//!
//! # Usage (JavaScript)
//! ```javascript,ignore
//! import init, { WordScrubber } from 'scrubcore';
//!
//! await init();
//! const scrubber = new WordScrubber({ terms: ['gdfgergerge'] });
//!
//! if (scrubber.quickMatch(node.textContent)) {
//!   if (scrubber.shouldHide(el.tagName.toLowerCase(), el.textContent)) {
//!     hide(el);
//!   } else {
//!     const clean = scrubber.rewriteText(text, hasPrev, prevEndsWithSpace);
//!     if (clean !== undefined) node.textContent = clean;
//!   }
//! }
//! ```

use wasm_bindgen::prelude::*;

use crate::filter::{
    normalize, Classification, Classifier, Rewriter, ScrubConfig, SiblingContext, TermMatcher,
};

#[wasm_bindgen]
pub struct WordScrubber {
    matcher: TermMatcher,
    rewriter: Rewriter,
    classifier: Classifier,
    config: ScrubConfig,
}

#[wasm_bindgen]
impl WordScrubber {
    /// Build a scrubber from a config object: `{ terms: [...], ... }`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WordScrubber, JsValue> {
        let config: ScrubConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let matcher = TermMatcher::compile(&config.terms).map_err(|e| {
            web_sys::console::error_1(&format!("[WordScrubber] {}", e).into());
            JsValue::from_str(&e)
        })?;
        let classifier = Classifier::new(&config.leaf_tags);
        Ok(WordScrubber {
            matcher,
            rewriter: Rewriter::new(),
            classifier,
            config,
        })
    }

    /// Boundary-aware test: does the text contain any banned term?
    #[wasm_bindgen(js_name = containsTerm)]
    pub fn contains_term(&self, text: &str) -> bool {
        self.matcher.test(text)
    }

    /// Cheap substring pre-filter, no boundary rules.
    #[wasm_bindgen(js_name = quickMatch)]
    pub fn quick_match(&self, text: &str) -> bool {
        self.matcher.quick_match(text)
    }

    /// Replace every banned span with a single space.
    #[wasm_bindgen(js_name = stripTerms)]
    pub fn strip_terms(&self, text: &str) -> String {
        self.matcher.strip(text)
    }

    /// Canonical lowercase form used for exact-phrase comparison.
    #[wasm_bindgen(js_name = normalizeText)]
    pub fn normalize_text(&self, text: &str) -> String {
        normalize(text)
    }

    /// Full grammar-repair rewrite of a text leaf. Returns `undefined`
    /// when the text needs no change, so the caller never performs a
    /// no-op write that would re-trigger its own mutation observer.
    #[wasm_bindgen(js_name = rewriteText)]
    pub fn rewrite_text(
        &self,
        text: &str,
        has_preceding_sibling: bool,
        preceding_ends_with_space: bool,
    ) -> Option<String> {
        let ctx = SiblingContext {
            has_preceding_sibling,
            preceding_text_ends_with_space: preceding_ends_with_space,
        };
        self.rewriter.rewrite(&self.matcher, text, ctx)
    }

    /// Hide verdict for an element given its lowercase tag name and its
    /// best text extraction.
    #[wasm_bindgen(js_name = shouldHide)]
    pub fn should_hide(&self, tag: &str, text: &str) -> bool {
        if !self.matcher.test(text) {
            return false;
        }
        let verdict = if self.config.leaf_tags.iter().any(|t| t == tag) {
            self.classifier.leaf_verdict(&self.matcher, text)
        } else {
            self.classifier.general_verdict(&self.matcher, text, text)
        };
        verdict == Classification::Hide
    }

    #[wasm_bindgen(js_name = termCount)]
    pub fn term_count(&self) -> usize {
        self.matcher.term_count()
    }

    /// Suggested scheduling intervals, as a JSON object.
    #[wasm_bindgen(js_name = getSchedule)]
    pub fn get_schedule(&self) -> JsValue {
        let schedule = serde_json::json!({
            "sweep_interval_ms": self.config.sweep_interval_ms,
            "probe_interval_ms": self.config.probe_interval_ms,
            "probe_ceiling_ms": self.config.probe_ceiling_ms,
            "delayed_scan_delay_ms": self.config.delayed_scan_delay_ms,
        });
        JsValue::from_str(&schedule.to_string())
    }
}
