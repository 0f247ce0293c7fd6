use std::time::Duration;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::{debug, warn};

use ecomentor_types::api::{AskRequest, AskResponse, ChatRole, ChatTurn, Claims};

use crate::auth::AppState;
use crate::error::ApiError;

pub const SYSTEM_PROMPT: &str = "You are EcoMentor, an educational mentor on the environment. \
Answer only questions related to ecology, sustainability, environment, energy, \
recycling, climate, green mobility, sustainable nutrition or energy saving. \
If the question does not concern these topics, answer exactly: \
'Question out of place'. \
Use a positive, educational and concise style.";

pub const UNANSWERED: &str = "Unable to answer the question, please try something else.";
pub const UNAVAILABLE: &str = "EcoMentor is not available at the moment, please try again later.";

#[derive(Debug, Deserialize)]
struct MentorReply {
    #[serde(default)]
    response: String,
}

/// Client for the external text-generation endpoint.
#[derive(Clone)]
pub struct MentorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MentorClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Never fails: transport and upstream problems become a fixed message.
    pub async fn ask(&self, history: &[ChatTurn], question: &str) -> String {
        let prompt = build_prompt(history, question);

        let response = match self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "message": prompt }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Mentor endpoint unreachable: {}", e);
                return UNAVAILABLE.to_string();
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            warn!("Mentor endpoint returned {}", response.status());
            return UNANSWERED.to_string();
        }

        match response.json::<MentorReply>().await {
            Ok(reply) => {
                let answer = reply.response.trim();
                if answer.is_empty() {
                    UNANSWERED.to_string()
                } else {
                    answer.to_string()
                }
            }
            Err(e) if e.is_timeout() => {
                warn!("Mentor reply timed out: {}", e);
                UNAVAILABLE.to_string()
            }
            Err(e) => {
                warn!("Mentor reply was not valid JSON: {}", e);
                UNANSWERED.to_string()
            }
        }
    }
}

pub fn build_prompt(history: &[ChatTurn], question: &str) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    for turn in history {
        let speaker = match turn.role {
            ChatRole::User => "User",
            ChatRole::Mentor => "EcoMentor",
        };
        prompt.push_str(&format!("{}: {}\n", speaker, turn.text.trim()));
    }
    prompt.push_str(&format!("Question: {}\nAnswer:", question.trim()));
    prompt
}

/// POST /mentor/ask
pub async fn ask(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::status(
            StatusCode::BAD_REQUEST,
            "Write a question before sending",
        ));
    }

    debug!("{} asked the mentor ({} prior turns)", claims.sub, req.history.len());
    let answer = state.mentor.ask(&req.history, &req.question).await;
    Ok(Json(AskResponse { answer }))
}
