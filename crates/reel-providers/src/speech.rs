//! OpenAI text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, ensure_success, env_key, env_secs, trim_base};

pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "alloy";
/// Documented per-request input limit of the speech endpoint.
pub const PROVIDER_INPUT_LIMIT: usize = 4096;

/// A service that renders a short text into MP3 bytes.
///
/// Outputs of consecutive calls must be byte-concatenable.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str) -> ProviderResult<Bytes>;
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub voice: String,
    pub timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_SPEECH_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl SpeechConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: trim_base(
                std::env::var("SPEECH_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_SPEECH_BASE_URL.to_string()),
            ),
            api_key: env_key("OPENAI_API_KEY"),
            model: std::env::var("SPEECH_MODEL")
                .unwrap_or_else(|_| DEFAULT_SPEECH_MODEL.to_string()),
            voice: std::env::var("SPEECH_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string()),
            timeout: env_secs("SPEECH_API_TIMEOUT_SECS", 60),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

pub struct OpenAiSpeechClient {
    http: Client,
    config: SpeechConfig,
}

impl OpenAiSpeechClient {
    pub fn new(config: SpeechConfig) -> ProviderResult<Self> {
        let http = build_client(config.timeout)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(SpeechConfig::from_env())
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn synthesize(&self, text: &str) -> ProviderResult<Bytes> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("OPENAI_API_KEY"))?;

        let url = format!("{}/audio/speech", self.config.base_url);
        let request = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            response_format: "mp3",
        };

        debug!(chars = text.chars().count(), voice = %self.config.voice, "Requesting speech");

        let response = self.http.post(&url).bearer_auth(key).json(&request).send().await?;
        let audio = ensure_success(response).await?.bytes().await?;
        if audio.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiSpeechClient {
        OpenAiSpeechClient::new(SpeechConfig {
            base_url: server.uri(),
            api_key: Some("k".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(body_partial_json(serde_json::json!({
                "model": "tts-1",
                "voice": "alloy",
                "input": "Hello there.",
                "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .mount(&server)
            .await;

        let audio = client_for(&server).synthesize("Hello there.").await.unwrap();
        assert_eq!(audio.as_ref(), &[0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn test_rejected_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("string too long"))
            .mount(&server)
            .await;

        let err = client_for(&server).synthesize("x").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_empty_audio_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = client_for(&server).synthesize("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }
}
