//! ScrubEngine: coordinator for live-tree scrubbing
//!
//! Single entry point tying the pieces together: compile the lexicon,
//! run the initial scan, watch for mutations, and drive the fallback
//! tasks that cover encapsulated sub-trees attached outside any
//! observable mutation.
//!
//! The engine never owns the tree or a scheduler. The host event loop
//! calls the matching entry point (`on_ready`, `on_loaded`,
//! `on_mutations`, `on_sweep_tick`, `on_probe_tick`, `on_delayed_scan`)
//! one at a time; published interval fields in `ScrubConfig` tell the
//! host how often to tick. All entry points are idempotent and safe to
//! interleave with external tree mutation - the visit ledger, not mutual
//! exclusion, is what prevents duplicate work.
//!
//! Failures never escape: host traversal errors are collected as
//! `ScanError` records and scanning continues with the rest of the tree.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::host::{Mutation, NodeId, Selector, TreeHost};

use super::classify::Classifier;
use super::ledger::{LedgerStats, VisitLedger};
use super::lexicon::TermMatcher;
use super::reconcile::{self, Candidate, LatePattern};
use super::rewrite::Rewriter;
use super::walk::WalkPass;

// ==================== TYPE DEFINITIONS ====================

/// Engine configuration. The lexicon is the only required input; every
/// other field defaults to the production values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Banned terms, matched case-insensitively.
    pub terms: Vec<String>,
    /// Non-renderable containers excluded from both passes.
    #[serde(default = "default_skip_tags")]
    pub skip_tags: Vec<String>,
    /// Leaf-style containers classified by the cheap cell rules.
    #[serde(default = "default_leaf_tags")]
    pub leaf_tags: Vec<String>,
    /// Component tag known to create its encapsulated content late.
    #[serde(default = "default_late_host_tag")]
    pub late_host_tag: String,
    /// Nested component inside the late host, one level down.
    #[serde(default = "default_late_inner_tag")]
    pub late_inner_tag: String,
    /// Suggested host interval for `on_sweep_tick`.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Suggested host interval for `on_probe_tick`.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Wall-clock limit after which the probe self-cancels.
    #[serde(default = "default_probe_ceiling_ms")]
    pub probe_ceiling_ms: u64,
    /// Suggested host delay for the one-shot `on_delayed_scan`.
    #[serde(default = "default_delayed_scan_ms")]
    pub delayed_scan_delay_ms: u64,
}

fn default_skip_tags() -> Vec<String> {
    ["script", "style", "noscript", "meta", "link", "title"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_leaf_tags() -> Vec<String> {
    ["td", "th", "span"].iter().map(|t| t.to_string()).collect()
}

fn default_late_host_tag() -> String {
    "rhdc-user-profile-card".to_string()
}

fn default_late_inner_tag() -> String {
    "sl-card".to_string()
}

fn default_sweep_interval_ms() -> u64 {
    100
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_ceiling_ms() -> u64 {
    30_000
}

fn default_delayed_scan_ms() -> u64 {
    7_000
}

impl ScrubConfig {
    /// Config with the given lexicon and default everything else.
    pub fn with_terms(terms: Vec<String>) -> Self {
        Self {
            terms,
            skip_tags: default_skip_tags(),
            leaf_tags: default_leaf_tags(),
            late_host_tag: default_late_host_tag(),
            late_inner_tag: default_late_inner_tag(),
            sweep_interval_ms: default_sweep_interval_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            probe_ceiling_ms: default_probe_ceiling_ms(),
            delayed_scan_delay_ms: default_delayed_scan_ms(),
        }
    }
}

/// Aggregate counters for one engine lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrubStats {
    pub full_scans: u64,
    pub batches: u64,
    pub sweeps: u64,
    pub subtree_passes: u64,
    pub elements_classified: u64,
    pub elements_hidden: u64,
    pub leaves_rewritten: u64,
    pub last_pass_us: u64,
}

/// Non-fatal failure swallowed during scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    pub phase: String,
    pub message: String,
}

impl ScanError {
    pub fn new(phase: &str, message: impl Into<String>) -> Self {
        Self {
            phase: phase.to_string(),
            message: message.into(),
        }
    }
}

/// Result of one probe tick, so the host can stop its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Continue,
    Cancelled,
}

/// One-way watch state. Watching persists for the engine lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    Unwatched,
    Watching,
}

#[derive(Debug, Default)]
struct ProbeState {
    ticks: u32,
    found: bool,
    cancelled: bool,
    delayed_armed: bool,
}

// ==================== MAIN IMPLEMENTATION ====================

pub struct ScrubEngine {
    config: ScrubConfig,
    matcher: TermMatcher,
    classifier: Classifier,
    rewriter: Rewriter,
    ledger: VisitLedger,
    watch: WatchState,
    init_done: bool,
    probe: ProbeState,
    stats: ScrubStats,
    errors: Vec<ScanError>,
}

impl ScrubEngine {
    /// Compile the lexicon and build an idle engine. Fails only on an
    /// unusable lexicon.
    pub fn new(config: ScrubConfig) -> Result<Self, String> {
        let matcher = TermMatcher::compile(&config.terms)?;
        let classifier = Classifier::new(&config.leaf_tags);
        Ok(Self {
            config,
            matcher,
            classifier,
            rewriter: Rewriter::new(),
            ledger: VisitLedger::new(),
            watch: WatchState::Unwatched,
            init_done: false,
            probe: ProbeState::default(),
            stats: ScrubStats::default(),
            errors: Vec::new(),
        })
    }

    // ---- lifecycle entry points ----

    /// Initial readiness: full scan, then start watching. Re-entrant
    /// calls are no-ops.
    pub fn on_ready<H: TreeHost>(&mut self, host: &mut H) {
        if self.init_done {
            return;
        }
        self.init_done = true;
        self.process_everything(host);
        self.start_watching(host);
    }

    /// Load completion: full rescan (content often lands between
    /// readiness and load) and arm the one-shot delayed probe.
    pub fn on_loaded<H: TreeHost>(&mut self, host: &mut H) {
        self.process_everything(host);
        self.start_watching(host);
        self.probe.delayed_armed = true;
    }

    /// Reconcile one delivered batch of mutation notifications.
    pub fn on_mutations<H: TreeHost>(&mut self, host: &mut H, batch: &[Mutation]) {
        if batch.is_empty() {
            return;
        }
        self.stats.batches += 1;
        let candidates = {
            let late = LatePattern {
                host_tag: &self.config.late_host_tag,
                inner_tag: &self.config.late_inner_tag,
            };
            reconcile::collect_candidates(&*host, &self.matcher, &late, batch)
        };
        for candidate in candidates {
            match candidate {
                Candidate::Element(el) => {
                    // Detached between delivery and processing: walking it
                    // would waste work and resurrect removed nodes' styles.
                    if !host.is_attached(el) {
                        continue;
                    }
                    self.walk(host, el, 0);
                }
                Candidate::Subtree(root) => {
                    if !host.is_attached(root) {
                        continue;
                    }
                    self.ledger.evict_subtree(root);
                    self.walk(host, root, 1);
                }
            }
        }
    }

    /// Periodic fallback: walk encapsulated sub-trees that appeared
    /// without any observable mutation. Never self-cancels.
    pub fn on_sweep_tick<H: TreeHost>(&mut self, host: &mut H) {
        self.stats.sweeps += 1;
        let roots = self.find_all_subtree_roots(&*host);
        for root in roots {
            if !self.ledger.is_subtree_processed(root) {
                self.walk(host, root, 1);
            }
        }
    }

    /// Periodic probe for the late-initializing component. Self-cancels
    /// once the component has been found and processed, and
    /// unconditionally once the configured ceiling has elapsed.
    pub fn on_probe_tick<H: TreeHost>(&mut self, host: &mut H) -> ProbeOutcome {
        if self.probe.cancelled {
            return ProbeOutcome::Cancelled;
        }
        if self.probe.found {
            self.probe.cancelled = true;
            return ProbeOutcome::Cancelled;
        }
        self.probe.ticks += 1;
        if self.run_late_component_scan(host) {
            self.probe.found = true;
            self.probe.cancelled = true;
            return ProbeOutcome::Cancelled;
        }
        let elapsed_ms = u64::from(self.probe.ticks) * self.config.probe_interval_ms;
        if elapsed_ms >= self.config.probe_ceiling_ms {
            self.probe.cancelled = true;
            return ProbeOutcome::Cancelled;
        }
        ProbeOutcome::Continue
    }

    /// One-shot deferred probe, armed by `on_loaded`. No-op if the
    /// periodic probe already succeeded.
    pub fn on_delayed_scan<H: TreeHost>(&mut self, host: &mut H) {
        if !self.probe.delayed_armed {
            return;
        }
        self.probe.delayed_armed = false;
        if self.probe.found {
            return;
        }
        if self.run_late_component_scan(host) {
            self.probe.found = true;
        }
    }

    // ---- scanning ----

    /// Full pass: the main root, then every discovered encapsulated
    /// sub-tree not yet processed.
    pub fn process_everything<H: TreeHost>(&mut self, host: &mut H) {
        let Some(root) = host.root() else {
            return;
        };
        self.stats.full_scans += 1;
        self.walk(host, root, 0);
        let subtree_roots = self.find_all_subtree_roots(&*host);
        for sub_root in subtree_roots {
            if !self.ledger.is_subtree_processed(sub_root) {
                self.walk(host, sub_root, 1);
            }
        }
    }

    /// `Unwatched -> Watching`, one-way; repeat calls are no-ops.
    pub fn start_watching<H: TreeHost>(&mut self, host: &mut H) {
        if self.watch == WatchState::Watching {
            return;
        }
        if let Some(root) = host.root() {
            host.observe(root);
            self.watch = WatchState::Watching;
        }
    }

    fn walk<H: TreeHost>(&mut self, host: &mut H, root: NodeId, depth: u32) {
        let Self {
            matcher,
            classifier,
            rewriter,
            ledger,
            config,
            stats,
            errors,
            ..
        } = self;
        WalkPass {
            host,
            matcher,
            classifier,
            rewriter,
            ledger,
            skip_tags: config.skip_tags.as_slice(),
            stats,
            errors,
        }
        .run(root, depth);
    }

    /// Every encapsulated sub-tree root reachable from the main root,
    /// including sub-trees nested inside other sub-trees. Worklist with a
    /// visited set; malformed scopes are skipped.
    fn find_all_subtree_roots<H: TreeHost>(&mut self, host: &H) -> Vec<NodeId> {
        let mut found: HashSet<NodeId> = HashSet::new();
        let mut out = Vec::new();
        let Some(root) = host.root() else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(scope) = stack.pop() {
            let elements = match host.query_all(scope, &Selector::AnyElement) {
                Ok(elements) => elements,
                Err(message) => {
                    self.errors.push(ScanError::new("discover", message));
                    continue;
                }
            };
            for el in elements {
                if let Some(subtree) = host.owned_subtree(el) {
                    if found.insert(subtree) {
                        out.push(subtree);
                        stack.push(subtree);
                    }
                }
            }
        }
        out
    }

    /// Scan the main root and every sub-tree for the late component;
    /// force-rescan the encapsulated content of each one found. Returns
    /// whether any component was present.
    fn run_late_component_scan<H: TreeHost>(&mut self, host: &mut H) -> bool {
        let Some(root) = host.root() else {
            return false;
        };
        let mut scopes = vec![root];
        scopes.extend(self.find_all_subtree_roots(&*host));

        let selector = Selector::Tag(self.config.late_host_tag.clone());
        let mut found = false;
        for scope in scopes {
            let components = match host.query_all(scope, &selector) {
                Ok(components) => components,
                Err(message) => {
                    self.errors.push(ScanError::new("late-probe", message));
                    continue;
                }
            };
            if !components.is_empty() {
                found = true;
            }
            for component in components {
                let subtrees = {
                    let late = LatePattern {
                        host_tag: &self.config.late_host_tag,
                        inner_tag: &self.config.late_inner_tag,
                    };
                    reconcile::late_component_subtrees(&*host, component, &late)
                };
                for subtree in subtrees {
                    self.ledger.evict_subtree(subtree);
                    self.walk(host, subtree, 1);
                }
            }
        }
        found
    }

    // ---- introspection ----

    pub fn stats(&self) -> &ScrubStats {
        &self.stats
    }

    pub fn ledger_stats(&self) -> LedgerStats {
        self.ledger.stats()
    }

    /// Drain the non-fatal errors collected so far.
    pub fn take_errors(&mut self) -> Vec<ScanError> {
        std::mem::take(&mut self.errors)
    }

    pub fn is_watching(&self) -> bool {
        self.watch == WatchState::Watching
    }

    pub fn config(&self) -> &ScrubConfig {
        &self.config
    }
}

// ==================== TESTS ====================
