pub mod orchestrator;

pub use orchestrator::{PairlistGenerator, RunOutcome};
