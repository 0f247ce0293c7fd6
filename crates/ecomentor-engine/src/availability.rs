use chrono::NaiveDate;

use crate::catalog::ChallengeId;
use crate::history::CompletionHistory;

/// Days before a completed Hard challenge can be drawn as the daily again.
pub const DAILY_COOLDOWN_DAYS: i64 = 7;

/// Days before a completed Easy/Medium challenge can be offered as optional again.
pub const OPTIONAL_COOLDOWN_DAYS: i64 = 3;

/// A challenge is available when it is absent from the history, or when at
/// least `min_days` calendar days have passed since its recorded completion.
pub fn is_available(
    challenge_id: ChallengeId,
    history: &CompletionHistory,
    min_days: i64,
    today: NaiveDate,
) -> bool {
    match history.completed_on(challenge_id) {
        None => true,
        Some(completed) => (today - completed).num_days() >= min_days,
    }
}
