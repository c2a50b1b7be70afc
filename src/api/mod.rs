// src/api/mod.rs
pub mod advice;
pub mod chat;
pub mod health;
pub mod users;

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::ResponseResolver;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub resolver: Arc<ResponseResolver>,
}

pub async fn require_user(state: &AppState, user_id: i64) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
