//! Scrubcore: banned-term filter for live document trees
//!
//! Continuously scans a mutable hierarchical document tree - including
//! nested encapsulated sub-trees - for a fixed lexicon of banned terms,
//! rewriting the surrounding text so the sentence stays well-formed, or
//! hiding a container outright when removing the term would leave it
//! empty. Keeps working while third-party code mutates the tree.
//!
//! # Architecture
//!
//! ## Filter core (`src/filter/`)
//! - `lexicon.rs`   - TermMatcher: combined boundary-aware matcher + quick-match automaton
//! - `normalize.rs` - canonical text form for exact-phrase comparison
//! - `rewrite.rs`   - Rewriter: grammar-preserving repair of stripped text
//! - `classify.rs`  - Classifier: hide / rewrite / skip per container
//! - `walk.rs`      - WalkPass: worklist tree walker over a sub-root
//! - `ledger.rs`    - VisitLedger: processed-node idempotency guard
//! - `reconcile.rs` - mutation batch -> minimal re-scan candidate set
//! - `engine.rs`    - ScrubEngine: lifecycle, fallback tasks, stats
//!
//! ## Host surface
//! - `host.rs` - TreeHost trait: the minimum surface the core needs
//! - `tree.rs` - MemoryTree: arena-backed reference host
//! - `wasm.rs` - WordScrubber: text-level operations for JS drivers
//!
//! # Usage
//! ```rust,ignore
//! use scrubcore::{ScrubConfig, ScrubEngine};
//! use scrubcore::tree::MemoryTree;
//!
//! let mut tree = MemoryTree::new();
//! let body = tree.init_root("body");
//! // ... host builds and mutates the tree ...
//!
//! let mut engine = ScrubEngine::new(ScrubConfig::with_terms(vec![
//!     "gdfgergerge".into(),
//! ]))?;
//! engine.on_ready(&mut tree);                      // initial scan + watch
//! let batch = tree.take_mutations();
//! engine.on_mutations(&mut tree, &batch);          // incremental re-scan
//! engine.on_sweep_tick(&mut tree);                 // late sub-tree fallback
//! # Ok::<(), String>(())
//! ```

pub mod filter;
pub mod host;
pub mod tree;
pub mod wasm;

pub use filter::*;
pub use host::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("scrubcore v{}", env!("CARGO_PKG_VERSION"))
}
