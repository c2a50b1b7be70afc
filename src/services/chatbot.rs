use crate::{
    config::Config,
    constants::{LLM_MAX_TOKENS, LLM_SYSTEM_PROMPT, LLM_TEMPERATURE},
    error::{AppError, Result},
    services::llm_client::{CompletionRequest, LanguageModel, OpenAiClient},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Keyword fallback, checked in this order. Keywords are lowercase.
pub const KEYWORD_RESPONSES: &[(&str, &str)] = &[
    (
        "cibil",
        "Your CIBIL score is crucial! Aim for 750+ for best approval chances. Pay bills on time, keep credit utilization below 30%, and avoid multiple loan applications.",
    ),
    (
        "rejected",
        "Common rejection reasons: Low CIBIL score, high loan-to-income ratio, insufficient assets. Check your prediction details for personalized recommendations.",
    ),
    (
        "improve",
        "To improve approval chances: 1) Increase your CIBIL score, 2) Reduce loan amount, 3) Add a co-applicant, 4) Increase asset values, 5) Extend loan term.",
    ),
    (
        "documents",
        "Required documents: PAN card, Aadhaar, salary slips (3 months), bank statements (6 months), property papers (if any), employment proof.",
    ),
    (
        "income",
        "Include all sources: salary, rental income, business income, investments. Higher income improves approval chances significantly.",
    ),
    (
        "assets",
        "Assets act as security. Include residential property, commercial property, vehicles, gold, investments. Accurate valuation helps.",
    ),
    (
        "eligibility",
        "Use our Calculator tool for quick eligibility check. Generally, EMI shouldn't exceed 40% of monthly income.",
    ),
    (
        "approval",
        "Approval depends on: CIBIL score (35%), Income vs Loan (30%), Assets (20%), Employment (10%), Dependents (5%).",
    ),
];

pub const DEFAULT_REPLY: &str = "I can help with: CIBIL scores, loan rejections, approval tips, required documents, income calculation, asset evaluation, and eligibility checks. What would you like to know?";

#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub username: Option<String>,
    pub last_prediction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Model,
    Keyword,
    Default,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub source: ReplySource,
    /// Set when the model was tried and failed before falling back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
}

/// First keyword contained in `message`, case-insensitively.
pub fn keyword_reply(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    KEYWORD_RESPONSES
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, reply)| *reply)
}

pub fn rule_based_reply(message: &str) -> ChatReply {
    match keyword_reply(message) {
        Some(reply) => ChatReply {
            message: reply.to_string(),
            source: ReplySource::Keyword,
            model_error: None,
        },
        None => ChatReply {
            message: DEFAULT_REPLY.to_string(),
            source: ReplySource::Default,
            model_error: None,
        },
    }
}

// Internal helper that builds inputs for the model's user turn.
fn build_user_prompt(message: &str, context: Option<&ChatContext>) -> String {
    let username = context
        .and_then(|ctx| ctx.username.as_deref())
        .unwrap_or("User");
    let mut prompt = format!("User: {}\n", username);
    if let Some(last) = context.and_then(|ctx| ctx.last_prediction.as_deref()) {
        prompt.push_str(&format!("Last Prediction: {}\n", last));
    }
    prompt.push('\n');
    prompt.push_str(message);
    prompt
}

/// Answers chat messages: language model first, keyword table second.
pub struct ResponseResolver {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl ResponseResolver {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let model = match OpenAiClient::from_config(config)? {
            Some(client) => {
                tracing::info!("Chatbot using language model {}", client.model());
                Some(Arc::new(client) as Arc<dyn LanguageModel>)
            }
            None => None,
        };
        Ok(Self::new(model, Duration::from_millis(config.llm_timeout_ms)))
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn resolve(&self, message: &str, context: Option<&ChatContext>) -> ChatReply {
        let Some(model) = self.model.as_ref() else {
            return rule_based_reply(message);
        };

        match self.ask_model(model.as_ref(), message, context).await {
            Ok(text) => ChatReply {
                message: text,
                source: ReplySource::Model,
                model_error: None,
            },
            Err(err) => {
                tracing::warn!("Language model failed, using keyword reply: {}", err);
                ChatReply {
                    model_error: Some(err.to_string()),
                    ..rule_based_reply(message)
                }
            }
        }
    }

    async fn ask_model(
        &self,
        model: &dyn LanguageModel,
        message: &str,
        context: Option<&ChatContext>,
    ) -> Result<String> {
        let request = CompletionRequest {
            system: LLM_SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(message, context),
            max_tokens: LLM_MAX_TOKENS,
            temperature: LLM_TEMPERATURE,
        };

        match tokio::time::timeout(self.timeout, model.complete(&request)).await {
            Ok(result) => result.map(|text| text.trim().to_string()),
            Err(_) => Err(AppError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    enum Script {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedModel {
        script: Script,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedModel {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            match self.script {
                Script::Reply(text) => Ok(text.to_string()),
                Script::Fail => Err(AppError::ExternalAPI("quota exceeded".to_string())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    fn resolver_with(model: Arc<ScriptedModel>) -> ResponseResolver {
        ResponseResolver::new(
            Some(model as Arc<dyn LanguageModel>),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn every_keyword_returns_its_text_without_model() {
        let resolver = ResponseResolver::new(None, Duration::from_millis(50));
        for (keyword, text) in KEYWORD_RESPONSES {
            let message = format!("Tell me about {}", keyword.to_uppercase());
            let reply = resolver.resolve(&message, None).await;
            assert_eq!(reply.message, *text);
            assert_eq!(reply.source, ReplySource::Keyword);
        }
    }

    #[tokio::test]
    async fn unmatched_message_gets_default_reply() {
        let resolver = ResponseResolver::new(None, Duration::from_millis(50));
        let reply = resolver.resolve("what's the weather?", None).await;
        assert_eq!(reply.message, DEFAULT_REPLY);
        assert_eq!(reply.source, ReplySource::Default);
        assert!(reply.model_error.is_none());
    }

    #[test]
    fn earlier_keyword_wins_when_several_match() {
        // "income" comes before "approval" in the table
        let reply = keyword_reply("Does approval depend on INCOME?").unwrap();
        assert_eq!(reply, KEYWORD_RESPONSES[4].1);
        // "cibil" outranks "rejected"
        let reply = keyword_reply("rejected because of cibil").unwrap();
        assert_eq!(reply, KEYWORD_RESPONSES[0].1);
    }

    #[tokio::test]
    async fn model_reply_is_trimmed_and_marked() {
        let model = ScriptedModel::new(Script::Reply("  Keep utilisation low.  "));
        let reply = resolver_with(model.clone()).resolve("cibil tips", None).await;
        assert_eq!(reply.message, "Keep utilisation low.");
        assert_eq!(reply.source, ReplySource::Model);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].system, LLM_SYSTEM_PROMPT);
        assert_eq!(seen[0].max_tokens, LLM_MAX_TOKENS);
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_keywords_once() {
        let model = ScriptedModel::new(Script::Fail);
        let reply = resolver_with(model.clone())
            .resolve("which documents do I need", None)
            .await;
        assert_eq!(reply.source, ReplySource::Keyword);
        assert_eq!(reply.message, KEYWORD_RESPONSES[3].1);
        assert!(reply.model_error.unwrap().contains("quota exceeded"));
        assert_eq!(model.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slow_model_times_out_to_default() {
        let model = ScriptedModel::new(Script::Hang);
        let reply = resolver_with(model).resolve("hello there", None).await;
        assert_eq!(reply.source, ReplySource::Default);
        assert!(reply.model_error.unwrap().contains("timed out"));
    }

    #[test]
    fn prompt_includes_context_lines() {
        let ctx = ChatContext {
            username: Some("asha".to_string()),
            last_prediction: Some("Rejected (CIBIL 610)".to_string()),
        };
        let prompt = build_user_prompt("why?", Some(&ctx));
        assert_eq!(prompt, "User: asha\nLast Prediction: Rejected (CIBIL 610)\n\nwhy?");
    }

    #[test]
    fn prompt_defaults_username_without_context() {
        assert_eq!(build_user_prompt("hi", None), "User: User\n\nhi");
    }
}
