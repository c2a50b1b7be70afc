use axum::Json;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, PredictionData},
    services::advice::advise,
};

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub advice: Vec<String>,
}

/// Rejects figures the advice rules cannot evaluate (zero income divides by zero).
pub(crate) fn validate_prediction(data: &PredictionData) -> Result<()> {
    if !data.income_annum.is_finite() || data.income_annum <= 0.0 {
        return Err(AppError::BadRequest(
            "income_annum must be greater than 0".to_string(),
        ));
    }
    if !data.loan_amount.is_finite() || data.loan_amount < 0.0 {
        return Err(AppError::BadRequest(
            "loan_amount must be a non-negative number".to_string(),
        ));
    }
    let assets = [
        data.residential_assets_value,
        data.commercial_assets_value,
        data.luxury_assets_value,
    ];
    if assets.iter().flatten().any(|value| !value.is_finite() || *value < 0.0) {
        return Err(AppError::BadRequest(
            "asset values must be non-negative numbers".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/advice
pub async fn get_advice(
    Json(req): Json<PredictionData>,
) -> Result<Json<ApiResponse<AdviceResponse>>> {
    validate_prediction(&req)?;
    Ok(Json(ApiResponse::success(AdviceResponse {
        advice: advise(&req),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::advice::ADVICE_STRONG_PROFILE;

    fn data(income: f64) -> PredictionData {
        PredictionData {
            cibil_score: 800,
            loan_amount: 100_000.0,
            income_annum: income,
            residential_assets_value: Some(1_000_000.0),
            commercial_assets_value: None,
            luxury_assets_value: None,
        }
    }

    #[test]
    fn zero_income_is_rejected() {
        assert!(matches!(validate_prediction(&data(0.0)), Err(AppError::BadRequest(_))));
        assert!(validate_prediction(&data(-5.0)).is_err());
    }

    #[test]
    fn negative_assets_are_rejected() {
        let mut prediction = data(1_000_000.0);
        prediction.luxury_assets_value = Some(-1.0);
        assert!(validate_prediction(&prediction).is_err());
    }

    #[tokio::test]
    async fn handler_returns_advice_list() {
        let Json(body) = get_advice(Json(data(1_000_000.0))).await.unwrap();
        assert!(body.success);
        assert_eq!(body.data.advice, vec![ADVICE_STRONG_PROFILE.to_string()]);
    }
}
