use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use ecomentor_engine::profile::validate_password;
use ecomentor_engine::{EngineError, Repository, UserProfile};
use ecomentor_types::api::{ChangePasswordRequest, Claims, DeleteAccountRequest, ProfileResponse};

use crate::auth::{AppState, PasswordCheck, hash_password, verify_password};
use crate::error::ApiError;

fn load(state: &AppState, name: &str) -> Result<UserProfile, ApiError> {
    state
        .db
        .get_user(name)?
        .ok_or_else(|| EngineError::UserNotFound(name.to_string()).into())
}

fn password_matches(password: &str, user: &UserProfile) -> bool {
    verify_password(password, &user.password_hash) != PasswordCheck::Invalid
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let user = tokio::task::spawn_blocking(move || load(&st, &claims.sub)).await??;

    Ok(Json(ProfileResponse {
        badge: user.badge().to_string(),
        username: user.name,
        last_update: user.last_update,
        level: user.level,
        xp: user.xp,
    }))
}

/// PUT /profile/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
        let mut user = load(&st, &claims.sub)?;
        if !password_matches(&req.current_password, &user) {
            return Err(ApiError::status(
                StatusCode::UNAUTHORIZED,
                "Current password incorrect",
            ));
        }
        validate_password(&req.new_password)?;

        user.password_hash = hash_password(&req.new_password)?;
        st.db.upsert_user(&user)?;
        info!("Password changed for {}", user.name);
        Ok(())
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /profile. Needs the username typed back and the password.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.confirm_username != claims.sub {
        return Err(ApiError::status(
            StatusCode::BAD_REQUEST,
            "Username does not match",
        ));
    }

    let st = state.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
        let user = load(&st, &claims.sub)?;
        if !password_matches(&req.password, &user) {
            return Err(ApiError::status(StatusCode::UNAUTHORIZED, "Password incorrect"));
        }
        st.db.delete_user(&user.name)?;
        info!("Deleted account {}", user.name);
        Ok(())
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}
