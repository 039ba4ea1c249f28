//! TMDB poster lookup.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, download, ensure_success, env_key, env_secs, trim_base};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Finds a representative still image for a free-text title.
#[async_trait]
pub trait MediaSearch: Send + Sync {
    fn name(&self) -> &str;

    /// Image bytes for the first usable result.
    async fn lookup_image(&self, query: &str) -> ProviderResult<Bytes>;
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: String,
    pub image_base_url: String,
    /// v3 API key or v4 read access token
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_TMDB_IMAGE_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(20),
        }
    }
}

impl TmdbConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: trim_base(
                std::env::var("TMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_TMDB_BASE_URL.to_string()),
            ),
            image_base_url: trim_base(
                std::env::var("TMDB_IMAGE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_TMDB_IMAGE_BASE_URL.to_string()),
            ),
            api_key: env_key("TMDB_API_KEY").or_else(|| env_key("TMDB_API_TOKEN")),
            timeout: env_secs("TMDB_TIMEOUT_SECS", 20),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    poster_path: Option<String>,
}

pub struct TmdbClient {
    http: Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> ProviderResult<Self> {
        if !config.is_configured() {
            return Err(ProviderError::not_configured("TMDB_API_KEY"));
        }
        let http = build_client(config.timeout)?;
        Ok(Self { http, config })
    }

    /// `None` when no TMDB credentials are present.
    pub fn from_env() -> ProviderResult<Option<Self>> {
        let config = TmdbConfig::from_env();
        if !config.is_configured() {
            return Ok(None);
        }
        Self::new(config).map(Some)
    }

    fn search_url(&self, query: &str, key: &str) -> ProviderResult<Url> {
        let mut url = Url::parse(&format!("{}/search/movie", self.config.base_url))
            .map_err(|e| ProviderError::invalid_response(format!("bad TMDB base url: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            pairs.append_pair("include_adult", "false");
            if !is_bearer_token(key) {
                pairs.append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    /// Poster URL of the first result that has one.
    pub async fn find_poster(&self, query: &str) -> ProviderResult<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("TMDB_API_KEY"))?;

        let url = self.search_url(query, key)?;
        let mut request = self.http.get(url);
        if is_bearer_token(key) {
            request = request.bearer_auth(key);
        }

        let response = ensure_success(request.send().await?).await?;
        let body: SearchResponse = response.json().await?;

        body.results
            .into_iter()
            .filter_map(|r| r.poster_path)
            .find(|p| !p.trim().is_empty())
            .map(|p| format!("{}{}", self.config.image_base_url, p))
            .ok_or_else(|| ProviderError::NotFound(query.to_string()))
    }
}

/// v4 read access tokens are JWTs; v3 keys are short hex strings.
fn is_bearer_token(key: &str) -> bool {
    key.starts_with("eyJ")
}

#[async_trait]
impl MediaSearch for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn lookup_image(&self, query: &str) -> ProviderResult<Bytes> {
        let poster = self.find_poster(query).await?;
        debug!(query, poster = %poster, "Downloading poster");
        download(&self.http, &poster).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: &str) -> TmdbClient {
        TmdbClient::new(TmdbConfig {
            base_url: server.uri(),
            image_base_url: format!("{}/img", server.uri()),
            api_key: Some(key.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_downloads_first_poster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "The Matrix"))
            .and(query_param("include_adult", "false"))
            .and(query_param("api_key", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"poster_path": null}, {"poster_path": "/m.jpg"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/m.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG".to_vec()))
            .mount(&server)
            .await;

        let image = client_for(&server, "abc123").lookup_image("The Matrix").await.unwrap();
        assert_eq!(image.as_ref(), b"JPEG");
    }

    #[tokio::test]
    async fn test_read_token_uses_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(header("authorization", "Bearer eyJtoken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"poster_path": "/p.jpg"}]
            })))
            .mount(&server)
            .await;

        let poster = client_for(&server, "eyJtoken").find_poster("Heat").await.unwrap();
        assert!(poster.ends_with("/img/p.jpg"));
    }

    #[tokio::test]
    async fn test_no_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, "abc").lookup_image("zzzz").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[test]
    fn test_unconfigured_client_rejected() {
        assert!(TmdbClient::new(TmdbConfig::default()).is_err());
    }
}
