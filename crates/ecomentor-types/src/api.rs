use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims issued at register/login and checked by the auth middleware.
/// `sub` is the username, which is the user's primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Challenges --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeCard {
    pub id: i64,
    pub title: String,
    pub category: String,
    #[serde(rename = "ecoImpact")]
    pub eco_impact: f64,
    pub difficulty: String,
    pub completed_today: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TodayResponse {
    Assigned {
        date: NaiveDate,
        daily: ChallengeCard,
        optional: Option<ChallengeCard>,
    },
    NothingToday {
        date: NaiveDate,
        message: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub challenge_id: i64,
    pub xp_gain: u64,
    pub co2_gain: f64,
    pub xp: u64,
    pub level: u32,
    pub levels_gained: u32,
    pub badge: String,
    pub co2_saved: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkipResponse {
    pub replaced: bool,
    pub optional: Option<ChallengeCard>,
    pub message: Option<String>,
}

// -- Dashboard / profile --

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub level: u32,
    pub badge: String,
    pub challenges_completed: u32,
    pub xp: u64,
    pub next_level_xp: u64,
    pub co2_saved: f64,
    pub co2_goal: u32,
    pub goal_progress: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGoalRequest {
    pub goal: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteAccountRequest {
    pub confirm_username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub last_update: Option<NaiveDate>,
    pub level: u32,
    pub xp: u64,
    pub badge: String,
}

// -- Mentor --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Mentor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}
