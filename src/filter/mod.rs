pub mod classify;
pub mod engine;
pub mod ledger;
pub mod lexicon;
pub mod normalize;
pub mod reconcile;
pub mod rewrite;
pub mod walk;

pub use classify::*;
pub use engine::*;
pub use ledger::*;
pub use lexicon::*;
pub use normalize::*;
pub use reconcile::*;
pub use rewrite::*;
pub use walk::*;
