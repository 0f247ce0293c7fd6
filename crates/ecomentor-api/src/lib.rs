pub mod auth;
pub mod challenges;
pub mod dashboard;
pub mod error;
pub mod mentor;
pub mod middleware;
pub mod profile;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use chrono::NaiveDate;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Calendar date used for day rollover and cooldowns.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// All routes, without the CORS/trace layers the server adds on top.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/challenges/today", get(challenges::get_today))
        .route("/challenges/daily/complete", post(challenges::complete_daily))
        .route("/challenges/optional/complete", post(challenges::complete_optional))
        .route("/challenges/optional/skip", post(challenges::skip_optional))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/profile/goal", put(dashboard::update_goal))
        .route("/profile/password", put(profile::change_password))
        .route("/profile", get(profile::get_profile).delete(profile::delete_account))
        .route("/mentor/ask", post(mentor::ask))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
