use crate::config::OpenAiConfig;
use crate::error::LlmError;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Length of the vectors returned by [`OpenAiClient::embed`]
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// Answer returned when no endpoint or key is configured
pub const NOT_CONFIGURED_REPLY: &str = "I apologize, but I encountered an issue while processing your request. The Azure OpenAI service is not properly configured.";

/// Answer returned when the completion request fails
pub const FAILURE_REPLY: &str = "I apologize, but I encountered an issue while processing your request. Please try again later or contact Nestlé customer support for assistance.";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for a hosted chat-completion deployment
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn completions_url(&self) -> Result<String, LlmError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or(LlmError::ConfigurationMissing("endpoint"))?;

        Ok(format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        ))
    }

    /// Ask the deployment to answer `question`, optionally grounded in
    /// `context`
    pub async fn try_generate(&self, question: &str, context: &str) -> Result<String, LlmError> {
        let url = self.completions_url()?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::ConfigurationMissing("api key"))?;

        let body = json!({
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": user_message(question, context) },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": 0.95,
            "frequency_penalty": 0,
            "presence_penalty": 0,
        });

        ::log::debug!("Sending request to {}", url);
        let response = self
            .http
            .post(&url)
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or(LlmError::EmptyCompletion)
    }

    /// Like [`OpenAiClient::try_generate`], but never fails: configuration
    /// gaps and request errors turn into a fixed apology
    pub async fn generate(&self, question: &str, context: &str) -> String {
        match self.try_generate(question, context).await {
            Ok(text) => text,
            Err(LlmError::ConfigurationMissing(what)) => {
                ::log::error!("Chat completion {} is not configured", what);
                NOT_CONFIGURED_REPLY.to_string()
            }
            Err(e) => {
                ::log::error!("Error generating response: {}", e);
                FAILURE_REPLY.to_string()
            }
        }
    }

    /// Embedding for `text`.
    ///
    /// No embeddings deployment is wired up yet, so this returns random
    /// values in `[-1, 1)`.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        ::log::debug!("Using mock embedding for {} chars", text.chars().count());
        let mut rng = rand::thread_rng();
        (0..EMBEDDING_DIMENSIONS)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect()
    }
}

fn user_message(question: &str, context: &str) -> String {
    if context.is_empty() {
        question.to_string()
    } else {
        format!(
            "Context information about products:\n{}\n\nQuestion: {}\n\nAnswer:",
            context, question
        )
    }
}
