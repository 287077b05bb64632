//! Score Handoff
//!
//! The relay core does not own score persistence; it validates game-over
//! reports and hands records to an injected collaborator. The in-memory
//! store here backs tests and single-process deployments.

pub mod sink;
pub mod store;

pub use sink::ScoreSink;
pub use store::{MemoryScoreStore, ScoreError, ScoreRecord, ScoreStore};
