use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, CreateUserRequest, PredictionRecord, RecordPredictionRequest, UserProfile},
    services::{
        advice::advise,
        gamification::{find_badge, is_event_badge, user_badges, Badge},
        BadgeEngine,
    },
};

use super::{advice::validate_prediction, require_user, AppState};

const MAX_USERNAME_CHARS: usize = 64;

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub user_id: i64,
    pub points: i64,
    pub count: usize,
    pub badges: Vec<&'static Badge>,
}

#[derive(Debug, Serialize)]
pub struct PredictionOutcome {
    pub prediction: PredictionRecord,
    pub advice: Vec<String>,
    pub new_badges: Vec<&'static Badge>,
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: UserProfile,
    pub new_badges: Vec<&'static Badge>,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
    pub awarded: Option<&'static Badge>,
    pub points: i64,
}

// Internal helper that parses or transforms values for `normalize_username`.
fn normalize_username(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("username is required".to_string()));
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "username must be at most {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

// Internal helper that checks conditions for `event_badge`.
fn event_badge(key: &str) -> Result<&'static Badge> {
    let badge =
        find_badge(key).ok_or_else(|| AppError::NotFound(format!("Unknown badge: {}", key)))?;
    if !is_event_badge(badge.key) {
        return Err(AppError::BadRequest(format!(
            "Badge {} is awarded automatically and cannot be claimed",
            badge.key
        )));
    }
    Ok(badge)
}

// Internal helper that parses or transforms values for `normalize_loan_status`.
fn normalize_loan_status(raw: &str) -> Result<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "approved" => Ok("Approved"),
        "rejected" => Ok("Rejected"),
        _ => Err(AppError::BadRequest(
            "loan_status must be Approved or Rejected".to_string(),
        )),
    }
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let username = normalize_username(&req.username)?;
    let user = state.db.create_user(&username).await?;
    tracing::info!("User ready: id={}, username={}", user.id, user.username);
    Ok(Json(ApiResponse::success(UserProfile::from(user))))
}

/// GET /api/v1/users/{user_id}/badges
pub async fn get_badges(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<BadgesResponse>>> {
    let user = require_user(&state, user_id).await?;
    let badges = user_badges(&user);

    Ok(Json(ApiResponse::success(BadgesResponse {
        user_id: user.id,
        points: user.points,
        count: badges.len(),
        badges,
    })))
}

/// POST /api/v1/users/{user_id}/predictions
pub async fn record_prediction(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<RecordPredictionRequest>,
) -> Result<Json<ApiResponse<PredictionOutcome>>> {
    validate_prediction(&req.data)?;
    let loan_status = normalize_loan_status(&req.loan_status)?;
    let mut user = require_user(&state, user_id).await?;

    let prediction = state
        .db
        .insert_prediction(user_id, &req.data, loan_status)
        .await?;
    let predictions = state.db.list_predictions(user_id).await?;

    let engine = BadgeEngine::new(state.db.clone());
    let mut new_badges = engine.check_and_award(&mut user, &predictions).await?;
    new_badges.extend(engine.award_for_prediction(&mut user, &prediction).await?);
    tracing::info!(
        "Prediction recorded: user={}, status={}, total={}, new_badges={}",
        user_id,
        loan_status,
        predictions.len(),
        new_badges.len()
    );

    Ok(Json(ApiResponse::success(PredictionOutcome {
        advice: advise(&prediction.data()),
        prediction,
        new_badges,
        points: user.points,
    })))
}

/// POST /api/v1/users/{user_id}/verify
pub async fn verify_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<VerifyResponse>>> {
    let mut user = state
        .db
        .set_verified(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let predictions = state.db.list_predictions(user_id).await?;

    let engine = BadgeEngine::new(state.db.clone());
    let new_badges = engine.check_and_award(&mut user, &predictions).await?;

    Ok(Json(ApiResponse::success(VerifyResponse {
        user: UserProfile::from(user),
        new_badges,
    })))
}

/// POST /api/v1/users/{user_id}/badges/{badge_key}
///
/// Event badges (calculator, export, streak) are awarded by the caller that
/// observed the event.
pub async fn award_event_badge(
    State(state): State<AppState>,
    Path((user_id, badge_key)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<AwardResponse>>> {
    let badge = event_badge(&badge_key)?;
    let mut user = require_user(&state, user_id).await?;

    let engine = BadgeEngine::new(state.db.clone());
    let awarded = engine.award_badge(&mut user, badge.key).await?;

    Ok(Json(ApiResponse::success(AwardResponse {
        awarded,
        points: user.points,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_username_trims_and_limits() {
        assert_eq!(normalize_username("  asha ").unwrap(), "asha");
        assert!(normalize_username("").is_err());
        assert!(normalize_username(&"x".repeat(MAX_USERNAME_CHARS + 1)).is_err());
    }

    #[test]
    fn normalize_loan_status_is_case_insensitive() {
        assert_eq!(normalize_loan_status(" approved ").unwrap(), "Approved");
        assert_eq!(normalize_loan_status("REJECTED").unwrap(), "Rejected");
        assert!(normalize_loan_status("pending").is_err());
    }

    #[test]
    fn event_badge_accepts_activity_badges_only() {
        assert_eq!(event_badge("calculator_user").unwrap().points, 15);
        assert!(event_badge("export_expert").is_ok());
        assert!(event_badge("week_streak").is_ok());
        for key in [
            "first_prediction",
            "verified_user",
            "prediction_master",
            "high_score",
            "approved_once",
        ] {
            assert!(matches!(event_badge(key), Err(AppError::BadRequest(_))));
        }
        assert!(matches!(event_badge("moon_landing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn badge_count_matches_listed_badges() {
        let mut user = crate::models::test_user(r#"["retired_badge","high_score"]"#);
        user.points = 40;
        let badges = user_badges(&user);
        let body = BadgesResponse {
            user_id: user.id,
            points: user.points,
            count: badges.len(),
            badges,
        };
        assert_eq!(body.count, 1);
        assert_eq!(body.count, body.badges.len());
    }

    #[test]
    fn award_response_serializes_missing_badge_as_null() {
        let body = serde_json::to_value(AwardResponse {
            awarded: None,
            points: 25,
        })
        .unwrap();
        assert!(body["awarded"].is_null());

        let body = serde_json::to_value(AwardResponse {
            awarded: find_badge("export_expert"),
            points: 25,
        })
        .unwrap();
        assert_eq!(body["awarded"]["name"], "Data Export Expert");
        assert_eq!(body["awarded"]["points"], 25);
    }
}
