use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    constants::MAX_CHAT_MESSAGE_CHARS,
    error::{AppError, Result},
    models::ApiResponse,
    services::chatbot::{ChatContext, ChatReply},
};

use super::{require_user, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<i64>,
}

// Internal helper that parses or transforms values for `normalize_message`.
fn normalize_message(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("message is required".to_string()));
    }
    if trimmed.chars().count() > MAX_CHAT_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message must be at most {} characters",
            MAX_CHAT_MESSAGE_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

async fn load_context(state: &AppState, user_id: i64) -> Result<ChatContext> {
    let user = require_user(state, user_id).await?;
    let last_prediction = state
        .db
        .latest_prediction(user_id)
        .await?
        .map(|prediction| prediction.summary());

    Ok(ChatContext {
        username: Some(user.username),
        last_prediction,
    })
}

/// POST /api/v1/chat
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>> {
    let message = normalize_message(&req.message)?;
    let context = match req.user_id {
        Some(user_id) => Some(load_context(&state, user_id).await?),
        None => None,
    };

    let reply = state.resolver.resolve(&message, context.as_ref()).await;
    tracing::info!(
        "Chat reply: user={:?}, source={:?}, model_error={}",
        req.user_id,
        reply.source,
        reply.model_error.is_some()
    );

    Ok(Json(ApiResponse::success(reply)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_message_trims() {
        assert_eq!(normalize_message("  what is cibil?\n").unwrap(), "what is cibil?");
    }

    #[test]
    fn normalize_message_rejects_blank() {
        assert!(matches!(normalize_message("   "), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn normalize_message_rejects_oversized() {
        let long = "a".repeat(MAX_CHAT_MESSAGE_CHARS + 1);
        assert!(matches!(normalize_message(&long), Err(AppError::BadRequest(_))));
        let limit = "a".repeat(MAX_CHAT_MESSAGE_CHARS);
        assert!(normalize_message(&limit).is_ok());
    }
}
