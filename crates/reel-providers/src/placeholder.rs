//! Remote label-card placeholder images.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reel_models::Resolution;

use crate::error::ProviderResult;
use crate::http::{build_client, download, env_secs, trim_base};

pub const DEFAULT_PLACEHOLDER_BASE_URL: &str = "https://placehold.co";

/// Renders a PNG card showing `label` at `size`.
#[async_trait]
pub trait PlaceholderSource: Send + Sync {
    async fn render(&self, size: Resolution, label: &str) -> ProviderResult<Bytes>;
}

#[derive(Debug, Clone)]
pub struct PlaceholdConfig {
    pub base_url: String,
    pub background: String,
    pub foreground: String,
    pub timeout: Duration,
}

impl Default for PlaceholdConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLACEHOLDER_BASE_URL.to_string(),
            background: "111".to_string(),
            foreground: "FFF".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl PlaceholdConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: trim_base(
                std::env::var("PLACEHOLDER_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_BASE_URL.to_string()),
            ),
            timeout: env_secs("PLACEHOLDER_TIMEOUT_SECS", 20),
            ..Default::default()
        }
    }
}

pub struct PlaceholdClient {
    http: Client,
    config: PlaceholdConfig,
}

impl PlaceholdClient {
    pub fn new(config: PlaceholdConfig) -> ProviderResult<Self> {
        let http = build_client(config.timeout)?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(PlaceholdConfig::from_env())
    }

    pub fn card_url(&self, size: Resolution, label: &str) -> String {
        format!(
            "{}/{}/{}/{}/png?text={}",
            self.config.base_url,
            size.as_dimensions(),
            self.config.background,
            self.config.foreground,
            urlencoding::encode(label)
        )
    }
}

#[async_trait]
impl PlaceholderSource for PlaceholdClient {
    async fn render(&self, size: Resolution, label: &str) -> ProviderResult<Bytes> {
        download(&self.http, &self.card_url(size, label)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_card_url_encodes_label() {
        let client = PlaceholdClient::new(PlaceholdConfig::default()).unwrap();
        assert_eq!(
            client.card_url(Resolution::new(1080, 1920), "Thanks for watching!"),
            "https://placehold.co/1080x1920/111/FFF/png?text=Thanks%20for%20watching%21"
        );
    }

    #[tokio::test]
    async fn test_render_fetches_png() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1920x1080/111/FFF/png"))
            .and(query_param("text", "Scene"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
            .mount(&server)
            .await;

        let client = PlaceholdClient::new(PlaceholdConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();

        let png = client.render(Resolution::new(1920, 1080), "Scene").await.unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = PlaceholdClient::new(PlaceholdConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap();

        assert!(client.render(Resolution::new(10, 10), "x").await.is_err());
    }
}
