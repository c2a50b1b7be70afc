use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== PREDICTION ====================
/// Applicant figures a loan prediction was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionData {
    pub cibil_score: i32,
    pub loan_amount: f64,
    pub income_annum: f64,
    #[serde(default)]
    pub residential_assets_value: Option<f64>,
    #[serde(default)]
    pub commercial_assets_value: Option<f64>,
    #[serde(default)]
    pub luxury_assets_value: Option<f64>,
}

impl PredictionData {
    /// Residential + commercial + luxury, missing values counted as zero.
    pub fn total_assets(&self) -> f64 {
        self.residential_assets_value.unwrap_or(0.0)
            + self.commercial_assets_value.unwrap_or(0.0)
            + self.luxury_assets_value.unwrap_or(0.0)
    }

    pub fn loan_to_income(&self) -> f64 {
        self.loan_amount / self.income_annum
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PredictionRecord {
    pub id: i64,
    pub user_id: i64,
    pub cibil_score: i32,
    pub loan_amount: f64,
    pub income_annum: f64,
    pub residential_assets_value: Option<f64>,
    pub commercial_assets_value: Option<f64>,
    pub luxury_assets_value: Option<f64>,
    pub loan_status: String, // Approved/Rejected
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn data(&self) -> PredictionData {
        PredictionData {
            cibil_score: self.cibil_score,
            loan_amount: self.loan_amount,
            income_annum: self.income_annum,
            residential_assets_value: self.residential_assets_value,
            commercial_assets_value: self.commercial_assets_value,
            luxury_assets_value: self.luxury_assets_value,
        }
    }

    /// One-line description handed to the chatbot as context.
    pub fn summary(&self) -> String {
        format!(
            "{} (CIBIL {}, loan {:.0}, annual income {:.0})",
            self.loan_status, self.cibil_score, self.loan_amount, self.income_annum
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordPredictionRequest {
    #[serde(flatten)]
    pub data: PredictionData,
    pub loan_status: String,
}

#[cfg(test)]
pub(crate) fn test_prediction(id: i64, user_id: i64) -> PredictionRecord {
    PredictionRecord {
        id,
        user_id,
        cibil_score: 720,
        loan_amount: 500_000.0,
        income_annum: 900_000.0,
        residential_assets_value: Some(200_000.0),
        commercial_assets_value: None,
        luxury_assets_value: None,
        loan_status: "Approved".to_string(),
        created_at: Utc::now(),
    }
}
