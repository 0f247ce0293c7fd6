use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use sha2::{Digest, Sha256};
use tracing::info;

use ecomentor_db::Database;
use ecomentor_engine::profile::{validate_password, validate_username};
use ecomentor_engine::{ChallengeService, Repository, UserProfile};
use ecomentor_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::mentor::MentorClient;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub service: ChallengeService<Arc<Database>>,
    pub jwt_secret: String,
    pub mentor: MentorClient,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String, mentor: MentorClient) -> AppState {
        let db = Arc::new(db);
        Arc::new(Self {
            service: ChallengeService::new(db.clone()),
            db,
            jwt_secret,
            mentor,
        })
    }
}

/// Same message for unknown users and wrong passwords.
const BAD_CREDENTIALS: &str = "Username or password incorrect";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    validate_username(&username)?;
    validate_password(&req.password)?;

    let st = state.clone();
    let name = username.clone();
    let password = req.password;
    let created = tokio::task::spawn_blocking(move || -> Result<bool, ApiError> {
        if st.db.user_exists(&name)? {
            return Ok(false);
        }
        let password_hash = hash_password(&password)?;
        let mut user = UserProfile::new(&name, &password_hash);
        user.last_update = Some(crate::today());
        Ok(st.db.create_user(&user)?)
    })
    .await??;

    if !created {
        return Err(ApiError::status(StatusCode::CONFLICT, "This name already exists."));
    }

    info!("Registered new user {}", username);
    let token = create_token(&state.jwt_secret, &username)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { username, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();

    let st = state.clone();
    let name = username.clone();
    let password = req.password;
    let accepted = tokio::task::spawn_blocking(move || -> Result<bool, ApiError> {
        let Some(mut user) = st.db.get_user(&name)? else {
            return Ok(false);
        };
        match verify_password(&password, &user.password_hash) {
            PasswordCheck::Valid => Ok(true),
            PasswordCheck::ValidLegacy => {
                // upgrade salted SHA-256 rows to Argon2id on first successful login
                user.password_hash = hash_password(&password)?;
                st.db.upsert_user(&user)?;
                info!("Upgraded legacy password hash for {}", name);
                Ok(true)
            }
            PasswordCheck::Invalid => Ok(false),
        }
    })
    .await??;

    if !accepted {
        return Err(ApiError::status(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS));
    }

    let token = create_token(&state.jwt_secret, &username)?;
    Ok(Json(AuthResponse { username, token }))
}

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(ApiError::internal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Matched an old `salt:sha256(password + salt)` hash.
    ValidLegacy,
    Invalid,
}

pub fn verify_password(password: &str, stored: &str) -> PasswordCheck {
    if stored.is_empty() {
        return PasswordCheck::Invalid;
    }

    if let Ok(parsed) = PasswordHash::new(stored) {
        return match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => PasswordCheck::Valid,
            Err(_) => PasswordCheck::Invalid,
        };
    }

    if let Some((salt, expected)) = stored.split_once(':') {
        let digest = hex::encode(Sha256::digest(format!("{}{}", password, salt).as_bytes()));
        if digest.eq_ignore_ascii_case(expected) {
            return PasswordCheck::ValidLegacy;
        }
    }

    PasswordCheck::Invalid
}

pub fn create_token(secret: &str, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
