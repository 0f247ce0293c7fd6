use chrono::NaiveDate;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::availability::{DAILY_COOLDOWN_DAYS, OPTIONAL_COOLDOWN_DAYS, is_available};
use crate::catalog::{Challenge, ChallengeId, Difficulty};
use crate::error::EngineError;
use crate::history::CompletionHistory;
use crate::profile::{DailyAssignment, DayState, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodayOutcome {
    /// Today's pair was already drawn; nothing changed.
    Existing(DailyAssignment),
    /// A fresh pair was drawn and stored on the user.
    Assigned(DailyAssignment),
    /// No Hard challenge is off cooldown. The user is left untouched.
    NothingToday,
}

impl TodayOutcome {
    pub fn assignment(&self) -> Option<DailyAssignment> {
        match self {
            Self::Existing(a) | Self::Assigned(a) => Some(*a),
            Self::NothingToday => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    Replaced(ChallengeId),
    NoAlternative,
}

/// Uniformly pick one Hard challenge outside its 7-day cooldown.
pub fn pick_daily<'a, R: Rng + ?Sized>(
    catalog: &'a [Challenge],
    history: &CompletionHistory,
    today: NaiveDate,
    rng: &mut R,
) -> Option<&'a Challenge> {
    let candidates: Vec<&Challenge> = catalog
        .iter()
        .filter(|c| c.difficulty == Difficulty::Hard)
        .filter(|c| is_available(c.id, history, DAILY_COOLDOWN_DAYS, today))
        .collect();

    candidates.choose(rng).copied()
}

/// Uniformly pick one Easy/Medium challenge outside its 3-day cooldown,
/// skipping every id in `exclude`.
pub fn pick_optional<'a, R: Rng + ?Sized>(
    catalog: &'a [Challenge],
    history: &CompletionHistory,
    exclude: &[ChallengeId],
    today: NaiveDate,
    rng: &mut R,
) -> Option<&'a Challenge> {
    let candidates: Vec<&Challenge> = catalog
        .iter()
        .filter(|c| c.difficulty.is_optional_tier())
        .filter(|c| !exclude.contains(&c.id))
        .filter(|c| is_available(c.id, history, OPTIONAL_COOLDOWN_DAYS, today))
        .collect();

    candidates.choose(rng).copied()
}

/// Move the user into `DailyAssigned` for `today`, drawing a new pair only
/// when the stored one belongs to another day.
pub fn ensure_today<R: Rng + ?Sized>(
    user: &mut UserProfile,
    catalog: &[Challenge],
    today: NaiveDate,
    rng: &mut R,
) -> TodayOutcome {
    if let DayState::DailyAssigned(assignment) = user.day_state(today) {
        if Challenge::find(catalog, assignment.daily).is_some() {
            return TodayOutcome::Existing(assignment);
        }
        warn!(
            "Daily {} assigned to {} is no longer in the catalog, redrawing",
            assignment.daily, user.name
        );
    }

    let Some(daily) = pick_daily(catalog, &user.history, today, rng) else {
        debug!("No Hard challenge available for {} on {}", user.name, today);
        return TodayOutcome::NothingToday;
    };

    let optional = pick_optional(catalog, &user.history, &[daily.id], today, rng).map(|c| c.id);

    let assignment = DailyAssignment {
        date: today,
        daily: daily.id,
        optional,
    };
    user.assignment = Some(assignment);

    info!(
        "Assigned daily {} (optional {:?}) to {} for {}",
        daily.id, optional, user.name, today
    );
    TodayOutcome::Assigned(assignment)
}

/// Re-roll only the optional pick for today. The daily and its date are kept.
pub fn skip_optional<R: Rng + ?Sized>(
    user: &mut UserProfile,
    catalog: &[Challenge],
    today: NaiveDate,
    rng: &mut R,
) -> Result<SkipOutcome, EngineError> {
    let DayState::DailyAssigned(assignment) = user.day_state(today) else {
        return Err(EngineError::NoAssignment);
    };

    let mut exclude = vec![assignment.daily];
    exclude.extend(assignment.optional);

    let Some(next) = pick_optional(catalog, &user.history, &exclude, today, rng) else {
        return Ok(SkipOutcome::NoAlternative);
    };

    user.assignment = Some(DailyAssignment {
        optional: Some(next.id),
        ..assignment
    });
    Ok(SkipOutcome::Replaced(next.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn challenge(id: ChallengeId, difficulty: Difficulty) -> Challenge {
        Challenge {
            id,
            title: format!("challenge {}", id),
            category: "Energy".into(),
            eco_impact: 5.0,
            difficulty,
        }
    }

    fn catalog() -> Vec<Challenge> {
        vec![
            challenge(1, Difficulty::Hard),
            challenge(2, Difficulty::Hard),
            challenge(3, Difficulty::Easy),
            challenge(4, Difficulty::Medium),
            challenge(5, Difficulty::Easy),
        ]
    }

    #[test]
    fn daily_is_always_hard_and_optional_never_hard() {
        let catalog = catalog();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut user = UserProfile::new("ada", "hash");
            let a = ensure_today(&mut user, &catalog, today(), &mut rng)
                .assignment()
                .unwrap();
            let daily = Challenge::find(&catalog, a.daily).unwrap();
            assert_eq!(daily.difficulty, Difficulty::Hard);
            let optional = Challenge::find(&catalog, a.optional.unwrap()).unwrap();
            assert!(optional.difficulty.is_optional_tier());
        }
    }

    #[test]
    fn same_day_is_idempotent() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let mut user = UserProfile::new("ada", "hash");

        let first = ensure_today(&mut user, &catalog, today(), &mut rng);
        assert!(matches!(first, TodayOutcome::Assigned(_)));
        for _ in 0..10 {
            let again = ensure_today(&mut user, &catalog, today(), &mut rng);
            assert_eq!(again, TodayOutcome::Existing(first.assignment().unwrap()));
        }
    }

    #[test]
    fn new_day_redraws() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let mut user = UserProfile::new("ada", "hash");
        ensure_today(&mut user, &catalog, today(), &mut rng);

        let tomorrow = today() + Duration::days(1);
        let next = ensure_today(&mut user, &catalog, tomorrow, &mut rng);
        assert!(matches!(next, TodayOutcome::Assigned(a) if a.date == tomorrow));
    }

    #[test]
    fn daily_respects_seven_day_cooldown() {
        let catalog = catalog();
        let mut user = UserProfile::new("ada", "hash");
        user.history.record(1, today() - Duration::days(6));
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_daily(&catalog, &user.history, today(), &mut rng).unwrap();
            assert_eq!(picked.id, 2);
        }
    }

    #[test]
    fn no_hard_available_leaves_user_untouched() {
        let catalog = catalog();
        let mut user = UserProfile::new("ada", "hash");
        user.history.record(1, today() - Duration::days(1));
        user.history.record(2, today() - Duration::days(2));
        let before = user.clone();

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            ensure_today(&mut user, &catalog, today(), &mut rng),
            TodayOutcome::NothingToday
        );
        assert_eq!(user, before);
    }

    #[test]
    fn optional_left_unset_when_none_eligible() {
        let catalog = vec![challenge(1, Difficulty::Hard), challenge(3, Difficulty::Easy)];
        let mut user = UserProfile::new("ada", "hash");
        user.history.record(3, today() - Duration::days(2));

        let mut rng = StdRng::seed_from_u64(1);
        let a = ensure_today(&mut user, &catalog, today(), &mut rng)
            .assignment()
            .unwrap();
        assert_eq!(a.daily, 1);
        assert_eq!(a.optional, None);
    }

    #[test]
    fn optional_cooldown_is_three_days() {
        let catalog = vec![challenge(1, Difficulty::Hard), challenge(3, Difficulty::Easy)];
        let mut history = CompletionHistory::new();
        history.record(3, today() - Duration::days(3));
        let mut rng = StdRng::seed_from_u64(1);
        let picked = pick_optional(&catalog, &history, &[1], today(), &mut rng);
        assert_eq!(picked.map(|c| c.id), Some(3));
    }

    #[test]
    fn skip_replaces_only_optional() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut user = UserProfile::new("ada", "hash");
        let before = ensure_today(&mut user, &catalog, today(), &mut rng)
            .assignment()
            .unwrap();

        let outcome = skip_optional(&mut user, &catalog, today(), &mut rng).unwrap();
        let after = user.assignment.unwrap();

        let SkipOutcome::Replaced(id) = outcome else {
            panic!("expected a replacement, got {:?}", outcome);
        };
        assert_eq!(after.optional, Some(id));
        assert_ne!(after.optional, before.optional);
        assert_eq!(after.daily, before.daily);
        assert_eq!(after.date, before.date);
    }

    #[test]
    fn skip_without_alternative_is_noop() {
        let catalog = vec![challenge(1, Difficulty::Hard), challenge(3, Difficulty::Easy)];
        let mut rng = StdRng::seed_from_u64(3);
        let mut user = UserProfile::new("ada", "hash");
        ensure_today(&mut user, &catalog, today(), &mut rng);
        let before = user.clone();

        let outcome = skip_optional(&mut user, &catalog, today(), &mut rng).unwrap();
        assert_eq!(outcome, SkipOutcome::NoAlternative);
        assert_eq!(user, before);
    }

    #[test]
    fn skip_requires_todays_assignment() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut user = UserProfile::new("ada", "hash");
        assert!(matches!(
            skip_optional(&mut user, &catalog, today(), &mut rng),
            Err(EngineError::NoAssignment)
        ));
    }

    #[test]
    fn vanished_daily_is_redrawn() {
        let catalog = catalog();
        let mut user = UserProfile::new("ada", "hash");
        user.assignment = Some(DailyAssignment { date: today(), daily: 99, optional: None });

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = ensure_today(&mut user, &catalog, today(), &mut rng);
        assert!(matches!(outcome, TodayOutcome::Assigned(a) if a.daily != 99));
    }
}
