//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, ensure_success, env_key, env_secs, trim_base};

pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// A service that turns a prompt into a JSON-object completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Send `prompt` as a single user message and return the raw content of
    /// the first choice.
    async fn complete_json(&self, prompt: &str) -> ProviderResult<String>;

    /// Model identifiers the provider exposes.
    async fn list_models(&self) -> ProviderResult<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ChatConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: trim_base(
                std::env::var("TEXT_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_CHAT_BASE_URL.to_string()),
            ),
            api_key: env_key("GROQ_API_KEY"),
            model: std::env::var("TEXT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            timeout: env_secs("TEXT_API_TIMEOUT_SECS", 120),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Chat completions client for any OpenAI-compatible endpoint.
pub struct ChatClient {
    http: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> ProviderResult<Self> {
        let http = build_client(config.timeout)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ChatConfig::from_env())
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("GROQ_API_KEY"))
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete_json(&self, prompt: &str) -> ProviderResult<String> {
        let key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "Requesting completion");

        let response = self.http.post(&url).bearer_auth(key).json(&request).send().await?;
        let response = ensure_success(response).await?;
        let body: ChatResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        let key = self.api_key()?;
        let url = format!("{}/models", self.config.base_url);

        let response = ensure_success(self.http.get(&url).bearer_auth(key).send().await?).await?;
        let list: ModelList = response.json().await?;

        let mut models: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
        models.sort();
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> ChatClient {
        ChatClient::new(ChatConfig {
            base_url: server.uri(),
            api_key: key.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_json_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer k"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_CHAT_MODEL,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"intro\":\"hi\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server, Some("k")).complete_json("go").await.unwrap();
        assert_eq!(content, "{\"intro\":\"hi\"}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).complete_json("go").await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).complete_json("go").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let err = client_for(&server, None).complete_json("go").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_list_models_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{"id": "mixtral"}, {"id": "llama-3.3-70b-versatile"}]
            })))
            .mount(&server)
            .await;

        let models = client_for(&server, Some("k")).list_models().await.unwrap();
        assert_eq!(models, vec!["llama-3.3-70b-versatile", "mixtral"]);
    }
}
