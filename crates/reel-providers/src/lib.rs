//! Clients for the third-party services the pipeline depends on.
//!
//! Each service sits behind an `async_trait` seam so the pipeline can be
//! exercised with in-memory fakes:
//! - [`TextGenerator`]: OpenAI-compatible chat completions (Groq by default)
//! - [`SpeechProvider`]: OpenAI text-to-speech
//! - [`MediaSearch`]: TMDB poster lookup
//! - [`PlaceholderSource`]: placehold.co label cards
//!
//! None of the clients retry; callers decide how to degrade.

pub mod error;
pub mod http;
pub mod placeholder;
pub mod search;
pub mod speech;
pub mod text;

pub use error::{ProviderError, ProviderResult};
pub use placeholder::{PlaceholdClient, PlaceholdConfig, PlaceholderSource};
pub use search::{MediaSearch, TmdbClient, TmdbConfig};
pub use speech::{OpenAiSpeechClient, SpeechConfig, SpeechProvider};
pub use text::{ChatClient, ChatConfig, TextGenerator};
