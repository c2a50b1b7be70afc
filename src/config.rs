use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Language model
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,
    pub llm_timeout_ms: u64,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            llm_timeout_ms: env::var("LLM_TIMEOUT_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.llm_timeout_ms == 0 {
            anyhow::bail!("LLM_TIMEOUT_MS must be > 0");
        }

        match self.openai_api_key.as_deref() {
            Some(key) if key.trim().is_empty() => {
                tracing::warn!("OPENAI_API_KEY is blank; chatbot will use keyword replies")
            }
            None => tracing::info!("OPENAI_API_KEY not set; chatbot will use keyword replies"),
            _ => {}
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// True when a usable language-model credential is present.
pub fn has_llm_provider_configured(config: &Config) -> bool {
    config
        .openai_api_key
        .as_deref()
        .map(|key| !key.trim().is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn test_config(database_url: &str) -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 3000,
        environment: "development".to_string(),
        database_url: database_url.to_string(),
        database_max_connections: 1,
        openai_api_key: None,
        openai_api_base: "http://127.0.0.1:9".to_string(),
        openai_model: "gpt-3.5-turbo".to_string(),
        llm_timeout_ms: 500,
        cors_allowed_origins: "*".to_string(),
    }
}
