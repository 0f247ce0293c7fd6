use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::info;

use ecomentor_engine::profile::validate_goal;
use ecomentor_engine::{EngineError, Repository, UserProfile, level_threshold};
use ecomentor_types::api::{Claims, DashboardResponse, UpdateGoalRequest};

use crate::auth::AppState;
use crate::error::ApiError;

fn dashboard(user: &UserProfile) -> DashboardResponse {
    DashboardResponse {
        level: user.level,
        badge: user.badge().to_string(),
        challenges_completed: user.completed_count(),
        xp: user.xp,
        next_level_xp: level_threshold(user.level),
        co2_saved: user.co2_saved,
        co2_goal: user.co2_goal,
        goal_progress: user.goal_progress(),
    }
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let name = claims.sub.clone();
    let user = tokio::task::spawn_blocking(move || st.db.get_user(&name))
        .await??
        .ok_or_else(|| EngineError::UserNotFound(claims.sub))?;

    Ok(Json(dashboard(&user)))
}

/// PUT /profile/goal: personal CO₂ goal in kg, 1..=1000.
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_goal(req.goal)?;

    let st = state.clone();
    let user = tokio::task::spawn_blocking(move || -> Result<UserProfile, ApiError> {
        let mut user = st
            .db
            .get_user(&claims.sub)?
            .ok_or_else(|| EngineError::UserNotFound(claims.sub.clone()))?;
        user.set_goal(req.goal)?;
        st.db.upsert_user(&user)?;
        Ok(user)
    })
    .await??;

    info!("{} set CO2 goal to {} kg", user.name, user.co2_goal);
    Ok(Json(dashboard(&user)))
}
