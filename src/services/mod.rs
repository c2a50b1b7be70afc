// All service modules
pub mod advice;
pub mod chatbot;
pub mod gamification;
pub mod llm_client;

// Re-export for convenience
pub use chatbot::ResponseResolver;
pub use gamification::BadgeEngine;
