use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Challenge;
use crate::error::EngineError;
use crate::history::record_completion;
use crate::profile::{DayState, UserProfile};
use crate::progression::{CO2_FACTOR, Progress, apply_completion, round_co2, xp_gain};
use crate::repository::Repository;
use crate::selector::{self, SkipOutcome, TodayOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Daily,
    Optional,
}

/// What the user sees for today once the pair is resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayView {
    pub date: NaiveDate,
    pub daily: Challenge,
    pub daily_done: bool,
    pub optional: Option<Challenge>,
    pub optional_done: bool,
    pub freshly_assigned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Completed {
        challenge: Challenge,
        xp_gain: u64,
        co2_gain: f64,
        progress: Progress,
    },
    /// The challenge was already recorded today; nothing was written.
    AlreadyCompleted { challenge: Challenge, on: NaiveDate },
}

/// Read-modify-write orchestration of the engine over a `Repository`.
pub struct ChallengeService<R> {
    repo: R,
    co2_factor: f64,
}

impl<R: Repository> ChallengeService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            co2_factor: CO2_FACTOR,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn load_user(&self, name: &str) -> Result<UserProfile, EngineError> {
        self.repo
            .get_user(name)?
            .ok_or_else(|| EngineError::UserNotFound(name.to_string()))
    }

    /// Resolve today's daily/optional pair, drawing and persisting one on the
    /// first view of the day. `Ok(None)` means no Hard challenge is available.
    pub fn today<G: Rng + ?Sized>(
        &self,
        name: &str,
        today: NaiveDate,
        rng: &mut G,
    ) -> Result<Option<TodayView>, EngineError> {
        let mut user = self.load_user(name)?;
        let catalog = self.repo.list_challenges()?;

        let outcome = selector::ensure_today(&mut user, &catalog, today, rng);
        let assignment = match outcome {
            TodayOutcome::NothingToday => return Ok(None),
            TodayOutcome::Existing(a) => a,
            TodayOutcome::Assigned(a) => {
                self.repo.upsert_user(&user)?;
                a
            }
        };

        let daily = Challenge::find(&catalog, assignment.daily)
            .cloned()
            .ok_or(EngineError::ChallengeMissing(assignment.daily))?;

        let optional = assignment.optional.and_then(|id| {
            let found = Challenge::find(&catalog, id).cloned();
            if found.is_none() {
                warn!("Optional challenge {} for {} is missing from the catalog", id, name);
            }
            found
        });

        let done_today = |id| user.history.completed_on(id) == Some(today);

        Ok(Some(TodayView {
            date: today,
            daily_done: done_today(daily.id),
            optional_done: optional.as_ref().is_some_and(|c| done_today(c.id)),
            daily,
            optional,
            freshly_assigned: matches!(outcome, TodayOutcome::Assigned(_)),
        }))
    }

    /// Complete today's daily or optional challenge.
    ///
    /// History, counters, XP, level, badge and CO₂ change together and are
    /// written back in one upsert. The assignment itself is left in place so
    /// the card stays visible for the rest of the day.
    pub fn complete(
        &self,
        name: &str,
        slot: Slot,
        today: NaiveDate,
    ) -> Result<CompletionOutcome, EngineError> {
        let mut user = self.load_user(name)?;

        let DayState::DailyAssigned(assignment) = user.day_state(today) else {
            return Err(EngineError::NoAssignment);
        };
        let id = match slot {
            Slot::Daily => assignment.daily,
            Slot::Optional => assignment.optional.ok_or(EngineError::NoOptional)?,
        };

        let catalog = self.repo.list_challenges()?;
        let challenge = Challenge::find(&catalog, id)
            .cloned()
            .ok_or(EngineError::ChallengeMissing(id))?;

        if let Some(on) = user.history.completed_on(id).filter(|d| *d == today) {
            return Ok(CompletionOutcome::AlreadyCompleted { challenge, on });
        }

        record_completion(&mut user, id, today, &catalog);
        let gain = xp_gain(&challenge);
        let progress = apply_completion(&mut user, gain, challenge.eco_impact, self.co2_factor);
        user.last_update = Some(today);

        self.repo.upsert_user(&user)?;

        info!(
            "{} completed {:?} challenge {}: +{} XP, level {}, {}",
            name, slot, id, gain, progress.level, progress.badge
        );

        Ok(CompletionOutcome::Completed {
            co2_gain: round_co2(challenge.eco_impact * self.co2_factor),
            challenge,
            xp_gain: gain,
            progress,
        })
    }

    /// Re-roll today's optional challenge. Stores nothing when no alternative exists.
    pub fn skip<G: Rng + ?Sized>(
        &self,
        name: &str,
        today: NaiveDate,
        rng: &mut G,
    ) -> Result<SkipOutcome, EngineError> {
        let mut user = self.load_user(name)?;
        let catalog = self.repo.list_challenges()?;

        let outcome = selector::skip_optional(&mut user, &catalog, today, rng)?;
        if let SkipOutcome::Replaced(_) = outcome {
            self.repo.upsert_user(&user)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Difficulty;
    use crate::progression::Badge;
    use crate::repository::MemoryRepository;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn challenge(id: i64, impact: f64, difficulty: Difficulty) -> Challenge {
        Challenge {
            id,
            title: format!("challenge {}", id),
            category: "Home".into(),
            eco_impact: impact,
            difficulty,
        }
    }

    fn service(catalog: Vec<Challenge>) -> ChallengeService<MemoryRepository> {
        let repo = MemoryRepository::new(catalog);
        repo.upsert_user(&UserProfile::new("ada", "hash")).unwrap();
        ChallengeService::new(repo)
    }

    #[test]
    fn end_to_end_fresh_user() {
        let svc = service(vec![
            challenge(1, 10.0, Difficulty::Hard),
            challenge(2, 4.0, Difficulty::Easy),
        ]);
        let mut rng = StdRng::seed_from_u64(42);

        let view = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        assert_eq!(view.daily.id, 1);
        assert_eq!(view.optional.as_ref().map(|c| c.id), Some(2));
        assert!(view.freshly_assigned);

        let CompletionOutcome::Completed { xp_gain, co2_gain, progress, .. } =
            svc.complete("ada", Slot::Daily, today()).unwrap()
        else {
            panic!("daily should complete");
        };
        assert_eq!(xp_gain, 20);
        assert_eq!(co2_gain, 1.0);
        assert_eq!(progress.xp, 20);

        let CompletionOutcome::Completed { xp_gain, progress, .. } =
            svc.complete("ada", Slot::Optional, today()).unwrap()
        else {
            panic!("optional should complete");
        };
        assert_eq!(xp_gain, 4);
        assert_eq!(progress.xp, 24);
        assert_eq!(progress.co2_saved, 1.4);
        assert_eq!(progress.badge, Badge::EcoNovice);

        let user = svc.repository().get_user("ada").unwrap().unwrap();
        assert_eq!(
            (user.completed_easy, user.completed_medium, user.completed_hard),
            (1, 0, 1)
        );
        assert_eq!(user.xp, 24);
        assert_eq!(user.co2_saved, 1.4);
        assert_eq!(user.last_update, Some(today()));
    }

    #[test]
    fn repeated_views_return_same_pair() {
        let svc = service(vec![
            challenge(1, 10.0, Difficulty::Hard),
            challenge(2, 10.0, Difficulty::Hard),
            challenge(3, 10.0, Difficulty::Hard),
            challenge(4, 4.0, Difficulty::Easy),
            challenge(5, 4.0, Difficulty::Medium),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let first = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        for _ in 0..5 {
            let again = svc.today("ada", today(), &mut rng).unwrap().unwrap();
            assert_eq!(again.daily.id, first.daily.id);
            assert_eq!(again.optional, first.optional);
            assert!(!again.freshly_assigned);
        }
    }

    #[test]
    fn completed_daily_stays_visible_and_marked_done() {
        let svc = service(vec![challenge(1, 10.0, Difficulty::Hard)]);
        let mut rng = StdRng::seed_from_u64(1);
        svc.today("ada", today(), &mut rng).unwrap();
        svc.complete("ada", Slot::Daily, today()).unwrap();

        let view = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        assert_eq!(view.daily.id, 1);
        assert!(view.daily_done);
        assert!(view.optional.is_none());
    }

    #[test]
    fn second_completion_same_day_is_rejected_without_writes() {
        let svc = service(vec![challenge(1, 10.0, Difficulty::Hard)]);
        let mut rng = StdRng::seed_from_u64(1);
        svc.today("ada", today(), &mut rng).unwrap();
        svc.complete("ada", Slot::Daily, today()).unwrap();
        let before = svc.repository().get_user("ada").unwrap();

        let outcome = svc.complete("ada", Slot::Daily, today()).unwrap();
        assert!(matches!(outcome, CompletionOutcome::AlreadyCompleted { on, .. } if on == today()));
        assert_eq!(svc.repository().get_user("ada").unwrap(), before);
    }

    #[test]
    fn completion_from_an_earlier_day_does_not_block() {
        let svc = service(vec![challenge(1, 10.0, Difficulty::Hard)]);
        let mut rng = StdRng::seed_from_u64(1);
        let first_day = today() - Duration::days(7);
        svc.today("ada", first_day, &mut rng).unwrap();
        svc.complete("ada", Slot::Daily, first_day).unwrap();

        let view = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        assert_eq!(view.daily.id, 1);
        assert!(!view.daily_done);

        let outcome = svc.complete("ada", Slot::Daily, today()).unwrap();
        let CompletionOutcome::Completed { progress, .. } = &outcome else {
            panic!("re-offered daily should complete, got {:?}", outcome);
        };
        assert_eq!(progress.xp, 40);
    }

    #[test]
    fn nothing_today_does_not_persist() {
        let svc = service(vec![challenge(3, 2.0, Difficulty::Easy)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(svc.today("ada", today(), &mut rng).unwrap().is_none());
        let user = svc.repository().get_user("ada").unwrap().unwrap();
        assert_eq!(user.assignment, None);
    }

    #[test]
    fn completing_without_assignment_fails() {
        let svc = service(vec![challenge(1, 10.0, Difficulty::Hard)]);
        assert!(matches!(
            svc.complete("ada", Slot::Daily, today()),
            Err(EngineError::NoAssignment)
        ));
    }

    #[test]
    fn completing_missing_optional_fails() {
        let svc = service(vec![challenge(1, 10.0, Difficulty::Hard)]);
        let mut rng = StdRng::seed_from_u64(1);
        svc.today("ada", today(), &mut rng).unwrap();
        assert!(matches!(
            svc.complete("ada", Slot::Optional, today()),
            Err(EngineError::NoOptional)
        ));
    }

    #[test]
    fn unknown_user_is_reported() {
        let svc = service(vec![]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            svc.today("bob", today(), &mut rng),
            Err(EngineError::UserNotFound(name)) if name == "bob"
        ));
        assert_eq!(svc.repository().user_count(), 1);
    }

    #[test]
    fn completed_daily_is_not_redrawn_within_cooldown() {
        let svc = service(vec![
            challenge(1, 10.0, Difficulty::Hard),
            challenge(2, 10.0, Difficulty::Hard),
        ]);
        let mut rng = StdRng::seed_from_u64(9);
        let first = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        svc.complete("ada", Slot::Daily, today()).unwrap();

        for offset in 1..7 {
            let day = today() + Duration::days(offset);
            let view = svc.today("ada", day, &mut rng).unwrap().unwrap();
            assert_ne!(view.daily.id, first.daily.id, "day +{}", offset);
        }
    }

    #[test]
    fn skip_persists_new_optional() {
        let svc = service(vec![
            challenge(1, 10.0, Difficulty::Hard),
            challenge(2, 4.0, Difficulty::Easy),
            challenge(3, 4.0, Difficulty::Medium),
        ]);
        let mut rng = StdRng::seed_from_u64(5);
        let view = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        let old = view.optional.unwrap().id;

        let outcome = svc.skip("ada", today(), &mut rng).unwrap();
        let SkipOutcome::Replaced(new_id) = outcome else {
            panic!("expected replacement");
        };
        assert_ne!(new_id, old);

        let view = svc.today("ada", today(), &mut rng).unwrap().unwrap();
        assert_eq!(view.optional.map(|c| c.id), Some(new_id));
        assert_eq!(view.daily.id, 1);
    }
}
