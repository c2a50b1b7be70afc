/// Application constants

pub const API_VERSION: &str = "v1";

// Language model request
pub const LLM_MAX_TOKENS: u32 = 150;
pub const LLM_TEMPERATURE: f32 = 0.7;
pub const LLM_SYSTEM_PROMPT: &str = "You are a helpful loan advisor assistant. Provide clear, concise advice about loan applications, credit scores, and financial planning. Keep responses under 100 words.";

// Advice thresholds
pub const ADVICE_MIN_CIBIL_SCORE: i32 = 700;
pub const ADVICE_MAX_LOAN_TO_INCOME: f64 = 4.0;
pub const ADVICE_MIN_ASSET_COVERAGE: f64 = 0.3; // of loan amount

// Badge thresholds
pub const PREDICTION_MASTER_THRESHOLD: usize = 10;
pub const HIGH_SCORE_MIN_CIBIL: i32 = 750; // exclusive
pub const MAX_AWARD_ATTEMPTS: usize = 3;

// Chat input
pub const MAX_CHAT_MESSAGE_CHARS: usize = 2_000;
