//! EcoMentor challenge engine.
//!
//! Pure rotation and progression rules for the habit tracker:
//! - cooldown-based availability of catalog challenges
//! - per-day daily/optional assignment with idempotent re-views
//! - bounded completion history (5 most recent)
//! - XP, level, badge and CO₂ progression
//!
//! Storage is reached only through the `Repository` trait, so everything here
//! runs against the in-memory repository in tests.

pub mod availability;
pub mod catalog;
pub mod error;
pub mod history;
pub mod profile;
pub mod progression;
pub mod repository;
pub mod selector;
pub mod service;

pub use availability::{DAILY_COOLDOWN_DAYS, OPTIONAL_COOLDOWN_DAYS, is_available};
pub use catalog::{Challenge, ChallengeId, Difficulty};
pub use error::{EngineError, ValidationError};
pub use history::{CompletionHistory, HISTORY_CAPACITY, record_completion};
pub use profile::{DailyAssignment, DayState, UserProfile};
pub use progression::{Badge, CO2_FACTOR, Progress, apply_completion, level_for_xp, level_threshold, xp_gain};
pub use repository::{MemoryRepository, Repository};
pub use selector::{SkipOutcome, TodayOutcome};
pub use service::{ChallengeService, CompletionOutcome, Slot, TodayView};
