pub mod blacklist;
pub mod confirm;
pub mod reconciler;
pub mod selector;
pub mod stats;

pub use blacklist::{load_blacklist, Blacklist, PairPattern};
#[cfg(test)]
pub use confirm::ScriptedConfirmer;
pub use confirm::{Confirmer, StdinConfirmer};
pub use reconciler::{ReconcileOutcome, WhitelistDiff, WhitelistReconciler};
pub use selector::{PairSelector, Selection, SelectionCriteria};
pub use stats::SelectionStats;
