use chrono::NaiveDate;

use crate::catalog::{ChallengeId, Difficulty};
use crate::error::ValidationError;
use crate::history::CompletionHistory;
use crate::progression::Badge;

pub const DEFAULT_CO2_GOAL: u32 = 10;
pub const MAX_CO2_GOAL: u32 = 1000;
const MAX_NAME_LEN: usize = 30;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 50;

/// The daily/optional pair drawn for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAssignment {
    pub date: NaiveDate,
    pub daily: ChallengeId,
    pub optional: Option<ChallengeId>,
}

/// Per-user day state, derived from the stored assignment and today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    NoDaily,
    DailyAssigned(DailyAssignment),
}

/// One user row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub password_hash: String,
    pub xp: u64,
    pub level: u32,
    pub co2_saved: f64,
    pub co2_goal: u32,
    pub completed_easy: u32,
    pub completed_medium: u32,
    pub completed_hard: u32,
    pub history: CompletionHistory,
    pub assignment: Option<DailyAssignment>,
    pub last_update: Option<NaiveDate>,
}

impl UserProfile {
    pub fn new(name: &str, password_hash: &str) -> Self {
        Self {
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            xp: 0,
            level: 1,
            co2_saved: 0.0,
            co2_goal: DEFAULT_CO2_GOAL,
            completed_easy: 0,
            completed_medium: 0,
            completed_hard: 0,
            history: CompletionHistory::new(),
            assignment: None,
            last_update: None,
        }
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_easy + self.completed_medium + self.completed_hard
    }

    /// Always recomputed from the counters and CO₂ total.
    pub fn badge(&self) -> Badge {
        Badge::for_progress(self.completed_count(), self.co2_saved)
    }

    pub fn bump_counter(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.completed_easy += 1,
            Difficulty::Medium => self.completed_medium += 1,
            Difficulty::Hard => self.completed_hard += 1,
        }
    }

    pub fn day_state(&self, today: NaiveDate) -> DayState {
        match self.assignment {
            Some(assignment) if assignment.date == today => DayState::DailyAssigned(assignment),
            _ => DayState::NoDaily,
        }
    }

    /// Share of the personal CO₂ goal reached, clamped to 1.0.
    pub fn goal_progress(&self) -> f64 {
        if self.co2_goal == 0 {
            return 0.0;
        }
        (self.co2_saved / self.co2_goal as f64).clamp(0.0, 1.0)
    }

    pub fn set_goal(&mut self, goal: u32) -> Result<(), ValidationError> {
        validate_goal(goal)?;
        self.co2_goal = goal;
        Ok(())
    }
}

/// Usernames are trimmed by the caller; letters, digits and spaces only.
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    if !name.chars().filter(|c| *c != ' ').all(char::is_alphanumeric) {
        return Err(ValidationError::NameCharset);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

pub fn validate_goal(goal: u32) -> Result<(), ValidationError> {
    if goal == 0 || goal > MAX_CO2_GOAL {
        return Err(ValidationError::GoalOutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn day_state_resets_on_new_date() {
        let mut user = UserProfile::new("ada", "hash");
        assert_eq!(user.day_state(date(19)), DayState::NoDaily);

        let assignment = DailyAssignment { date: date(19), daily: 1, optional: Some(2) };
        user.assignment = Some(assignment);
        assert_eq!(user.day_state(date(19)), DayState::DailyAssigned(assignment));
        assert_eq!(user.day_state(date(20)), DayState::NoDaily);
    }

    #[test]
    fn username_rules() {
        assert_eq!(validate_username("Green Team 7"), Ok(()));
        assert_eq!(validate_username("   "), Err(ValidationError::EmptyName));
        assert_eq!(validate_username(&"a".repeat(31)), Err(ValidationError::NameTooLong));
        assert_eq!(validate_username("ada!"), Err(ValidationError::NameCharset));
    }

    #[test]
    fn password_rules() {
        assert_eq!(validate_password("secret1"), Ok(()));
        assert_eq!(validate_password("abc"), Err(ValidationError::PasswordTooShort));
        assert_eq!(validate_password(&"x".repeat(51)), Err(ValidationError::PasswordTooLong));
        assert_eq!(validate_password("      "), Err(ValidationError::EmptyPassword));
    }

    #[test]
    fn goal_progress_is_clamped() {
        let mut user = UserProfile::new("ada", "hash");
        user.co2_saved = 5.0;
        assert!((user.goal_progress() - 0.5).abs() < 1e-9);
        user.co2_saved = 25.0;
        assert_eq!(user.goal_progress(), 1.0);
        assert!(user.set_goal(0).is_err());
        assert!(user.set_goal(1001).is_err());
        assert!(user.set_goal(50).is_ok());
        assert_eq!(user.co2_goal, 50);
    }
}
