//! Application state.

use std::sync::Arc;

use reel_media::FfmpegMuxer;
use reel_pipeline::{Collaborators, Pipeline, PipelineConfig};
use reel_providers::{
    ChatClient, MediaSearch, OpenAiSpeechClient, PlaceholdClient, SpeechConfig, TmdbClient,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::middleware::ClientRateLimiter;

/// Which upstream credentials were present at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderReadiness {
    pub text: bool,
    pub speech: bool,
    pub search: bool,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<Pipeline>,
    pub rate_limiter: Arc<ClientRateLimiter>,
    pub providers: ProviderReadiness,
}

impl AppState {
    /// Build the pipeline and its clients from the environment.
    ///
    /// Running FFmpeg processes are killed once `shutdown` flips to `true`.
    pub async fn new(config: ApiConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<Self> {
        let pipeline_config = PipelineConfig::from_env();
        tokio::fs::create_dir_all(&pipeline_config.output_dir).await?;
        tokio::fs::create_dir_all(&pipeline_config.work_dir).await?;

        let text = ChatClient::from_env()?;
        let speech = OpenAiSpeechClient::from_env()?;
        let search = TmdbClient::from_env()?;
        let placeholder = PlaceholdClient::from_env()?;

        let providers = ProviderReadiness {
            text: text.config().api_key.is_some(),
            speech: SpeechConfig::from_env().api_key.is_some(),
            search: search.is_some(),
        };
        if !providers.text {
            warn!("GROQ_API_KEY is not set; script generation will fail");
        }
        if !providers.speech {
            warn!("OPENAI_API_KEY is not set; narration will fail");
        }
        if !providers.search {
            info!("TMDB credentials not set; movie scenes use placeholders");
        }

        let muxer = FfmpegMuxer::new()
            .with_timeout(pipeline_config.ffmpeg_timeout_secs)
            .with_cancel(shutdown);
        let collaborators = Collaborators {
            text: Arc::new(text),
            speech: Arc::new(speech),
            search: search.map(|c| Arc::new(c) as Arc<dyn MediaSearch>),
            placeholder: Arc::new(placeholder),
            muxer: Arc::new(muxer),
        };

        Ok(Self::with_pipeline(
            config,
            Pipeline::new(pipeline_config, collaborators),
            providers,
        ))
    }

    /// Wrap an already-built pipeline.
    pub fn with_pipeline(config: ApiConfig, pipeline: Pipeline, providers: ProviderReadiness) -> Self {
        let rate_limiter = Arc::new(ClientRateLimiter::new(
            config.generate_rate_per_minute,
            config.generate_burst,
        ));
        Self {
            config,
            pipeline: Arc::new(pipeline),
            rate_limiter,
            providers,
        }
    }
}
