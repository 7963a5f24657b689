//! # FinFlex Progress Module
//!
//! XP and leveling engine. Owns every write to an account's `xp` and
//! `level`, records each grant in the award history and detects one-time
//! completion of goals and challenges.
//!
//! ## Invariants
//! - XP never goes negative
//! - Under `LevelPolicy::Derived` the stored level equals `level_for_xp(xp)`
//! - XP equals the sum of the account's award history
//! - A completable awards at most once

pub mod award;
pub mod completion;
pub mod engine;
pub mod errors;
pub mod schedule;
pub mod summary;

pub use award::{Account, AwardEvent, CommittedAward, LevelUpdate};
pub use completion::{CompletableKey, CompletionOutcome, ProgressUpdate, CHALLENGE_TARGET};
pub use engine::{CompletionReport, ProgressEngine, Reconciliation};
pub use errors::{ProgressError, ProgressResult};
pub use schedule::ThresholdSchedule;
pub use summary::{summarize, LevelPolicy, ProgressSummary};
