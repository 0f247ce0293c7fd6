use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use ecomentor_engine::{Challenge, CompletionOutcome, SkipOutcome, Slot, TodayView};
use ecomentor_types::api::{ChallengeCard, Claims, CompletionResponse, SkipResponse, TodayResponse};

use crate::auth::AppState;
use crate::error::ApiError;

const NOTHING_TODAY: &str = "No hard challenges available today! Try again tomorrow.";
const NO_ALTERNATIVE: &str = "No other easy/medium challenges available!";

fn card(challenge: &Challenge, completed_today: bool) -> ChallengeCard {
    ChallengeCard {
        id: challenge.id,
        title: challenge.title.clone(),
        category: challenge.category.clone(),
        eco_impact: challenge.eco_impact,
        difficulty: challenge.difficulty.to_string(),
        completed_today,
    }
}

fn optional_card(view: &TodayView) -> Option<ChallengeCard> {
    view.optional.as_ref().map(|c| card(c, view.optional_done))
}

/// GET /challenges/today: draws today's pair on the first view of the day.
pub async fn get_today(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let today = crate::today();
    let st = state.clone();
    let view = tokio::task::spawn_blocking(move || {
        st.service.today(&claims.sub, today, &mut rand::rng())
    })
    .await??;

    let response = match view {
        Some(view) => TodayResponse::Assigned {
            date: view.date,
            daily: card(&view.daily, view.daily_done),
            optional: optional_card(&view),
        },
        None => TodayResponse::NothingToday {
            date: today,
            message: NOTHING_TODAY.to_string(),
        },
    };

    Ok(Json(response))
}

pub async fn complete_daily(
    state: State<AppState>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    complete(state, claims, Slot::Daily).await
}

pub async fn complete_optional(
    state: State<AppState>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    complete(state, claims, Slot::Optional).await
}

async fn complete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    slot: Slot,
) -> Result<Json<CompletionResponse>, ApiError> {
    let today = crate::today();
    let st = state.clone();
    let outcome = tokio::task::spawn_blocking(move || st.service.complete(&claims.sub, slot, today))
        .await??;

    match outcome {
        CompletionOutcome::Completed {
            challenge,
            xp_gain,
            co2_gain,
            progress,
        } => Ok(Json(CompletionResponse {
            challenge_id: challenge.id,
            xp_gain,
            co2_gain,
            xp: progress.xp,
            level: progress.level,
            levels_gained: progress.levels_gained,
            badge: progress.badge.to_string(),
            co2_saved: progress.co2_saved,
        })),
        CompletionOutcome::AlreadyCompleted { challenge, on } => Err(ApiError::status(
            StatusCode::CONFLICT,
            format!("You already completed \"{}\" on {}", challenge.title, on),
        )),
    }
}

/// POST /challenges/optional/skip re-rolls the optional pick, keeping the daily.
pub async fn skip_optional(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let today = crate::today();
    let st = state.clone();
    let (outcome, view) = tokio::task::spawn_blocking(move || {
        let mut rng = rand::rng();
        let outcome = st.service.skip(&claims.sub, today, &mut rng)?;
        let view = st.service.today(&claims.sub, today, &mut rng)?;
        Ok::<_, ApiError>((outcome, view))
    })
    .await??;

    let optional = view.as_ref().and_then(optional_card);
    let response = match outcome {
        SkipOutcome::Replaced(_) => SkipResponse {
            replaced: true,
            optional,
            message: None,
        },
        SkipOutcome::NoAlternative => SkipResponse {
            replaced: false,
            optional,
            message: Some(NO_ALTERNATIVE.to_string()),
        },
    };

    Ok(Json(response))
}
