// src/models/mod.rs
pub mod prediction;
pub mod user;

pub use prediction::{PredictionData, PredictionRecord, RecordPredictionRequest};
pub use user::{ApiResponse, CreateUserRequest, User, UserProfile};

#[cfg(test)]
pub(crate) use prediction::test_prediction;
#[cfg(test)]
pub(crate) use user::test_user;
