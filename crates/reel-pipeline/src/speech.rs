//! Chunked speech synthesis.
//!
//! Narration longer than the provider's per-request limit is split into
//! sentence-sized chunks, synthesized one after another and appended to a
//! single MP3 file.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use reel_providers::SpeechProvider;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

fn sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[^.!?…。！？]*[.!?…。！？]+["'”’)\]]*|[^.!?…。！？]+"#)
            .unwrap_or_else(|e| panic!("sentence pattern is invalid: {e}"))
    })
}

/// Split text into sentence-like units, terminal punctuation and closing
/// quotes kept with their sentence. Blank units are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Each sentence that fits is its own chunk. Longer sentences are packed
/// greedily word by word; a single word longer than `limit` is cut at
/// character boundaries.
pub fn pack_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();

    for sentence in split_sentences(text) {
        if sentence.chars().count() <= limit {
            chunks.push(sentence.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > limit {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                for piece in chars.chunks(limit) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }

            let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
            if needed > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks
}

/// What happened while synthesizing one narration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisReport {
    pub chunks_total: usize,
    pub chunks_ok: usize,
    pub bytes_written: u64,
    /// Share of characters whose chunk synthesized
    pub coverage: f64,
}

/// Turns narration text into one audio file through a [`SpeechProvider`].
#[derive(Clone)]
pub struct ChunkedSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    max_chunk_chars: usize,
    min_coverage: f64,
}

impl ChunkedSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>, max_chunk_chars: usize) -> Self {
        Self {
            provider,
            max_chunk_chars: max_chunk_chars.max(1),
            min_coverage: 0.0,
        }
    }

    /// Fail when less than `ratio` of the characters were synthesized.
    pub fn with_min_coverage(mut self, ratio: f64) -> Self {
        self.min_coverage = ratio.clamp(0.0, 1.0);
        self
    }

    /// Synthesize `text` into `output`.
    ///
    /// Chunks are requested in order and their bytes appended. A failed
    /// chunk is skipped; the call fails only when nothing was written or
    /// coverage falls below the configured minimum.
    pub async fn synthesize_to_file(&self, text: &str, output: &Path) -> PipelineResult<SynthesisReport> {
        let chunks = pack_chunks(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Err(PipelineError::synthesis("narration is empty"));
        }

        let total_chars: usize = chunks.iter().map(|c| c.chars().count()).sum();
        let mut file = tokio::fs::File::create(output).await?;
        let mut report = SynthesisReport {
            chunks_total: chunks.len(),
            ..Default::default()
        };
        let mut ok_chars = 0usize;

        for (index, chunk) in chunks.iter().enumerate() {
            match self.provider.synthesize(chunk).await {
                Ok(audio) => {
                    file.write_all(&audio).await?;
                    report.bytes_written += audio.len() as u64;
                    report.chunks_ok += 1;
                    ok_chars += chunk.chars().count();
                    metrics::record_tts_chunk(true);
                }
                Err(e) => {
                    warn!(
                        chunk = index,
                        chars = chunk.chars().count(),
                        provider = self.provider.name(),
                        "Speech chunk failed, skipping: {}",
                        e
                    );
                    metrics::record_tts_chunk(false);
                }
            }
        }
        file.flush().await?;

        report.coverage = ok_chars as f64 / total_chars.max(1) as f64;
        debug!(
            chunks = report.chunks_total,
            ok = report.chunks_ok,
            bytes = report.bytes_written,
            "Synthesized narration"
        );

        if report.bytes_written == 0 {
            return Err(PipelineError::synthesis(format!(
                "all {} speech chunks failed",
                report.chunks_total
            )));
        }
        if report.coverage < self.min_coverage {
            return Err(PipelineError::synthesis(format!(
                "only {:.0}% of the narration was synthesized",
                report.coverage * 100.0
            )));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use reel_providers::{ProviderError, ProviderResult};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_split_keeps_punctuation_and_closers() {
        let units = split_sentences("He said \"Run!\" Then silence... Really? 終わり。次");
        assert_eq!(units, vec!["He said \"Run!\"", "Then silence...", "Really?", "終わり。", "次"]);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(pack_chunks("Hello there.", 4000), vec!["Hello there."]);
        assert!(pack_chunks("   \n ", 4000).is_empty());
    }

    #[test]
    fn test_chunks_respect_limit_and_order() {
        let text = "One two three four five six seven eight nine ten. Short one.";
        let chunks = pack_chunks(text, 20);

        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
        assert_eq!(chunks.last().map(String::as_str), Some("Short one."));

        let rebuilt: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_words_are_never_split_when_they_fit() {
        let chunks = pack_chunks("alpha beta gamma delta epsilon zeta eta theta.", 12);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!("alpha beta gamma delta epsilon zeta eta theta.".contains(word));
            }
        }
    }

    #[test]
    fn test_oversized_word_is_cut_on_char_boundaries() {
        let word = "ü".repeat(10);
        let chunks = pack_chunks(&word, 4);
        assert_eq!(chunks, vec!["üüüü", "üüüü", "üü"]);
    }

    #[test]
    fn test_limit_counts_chars_not_bytes() {
        let text = "日本語の文章です";
        assert_eq!(pack_chunks(text, 8), vec![text]);
    }

    struct Recorder {
        fail_on: Vec<usize>,
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechProvider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn synthesize(&self, text: &str) -> ProviderResult<Bytes> {
            let mut seen = self.seen.lock().unwrap();
            let index = seen.len();
            seen.push(text.to_string());
            if self.fail_on.contains(&index) {
                return Err(ProviderError::RequestFailed {
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(Bytes::from(format!("[{}]", index)))
        }
    }

    #[tokio::test]
    async fn test_chunks_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a.mp3");
        let provider = Arc::new(Recorder::new(vec![]));
        let synth = ChunkedSynthesizer::new(provider.clone(), 4000);

        let report = synth.synthesize_to_file("First. Second! Third?", &out).await.unwrap();

        assert_eq!(report.chunks_total, 3);
        assert_eq!(tokio::fs::read_to_string(&out).await.unwrap(), "[0][1][2]");
        assert_eq!(*provider.seen.lock().unwrap(), vec!["First.", "Second!", "Third?"]);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a.mp3");
        let synth = ChunkedSynthesizer::new(Arc::new(Recorder::new(vec![1])), 4000);

        let report = synth.synthesize_to_file("A. B. C.", &out).await.unwrap();

        assert_eq!(report.chunks_ok, 2);
        assert_eq!(tokio::fs::read_to_string(&out).await.unwrap(), "[0][2]");
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a.mp3");
        let synth = ChunkedSynthesizer::new(Arc::new(Recorder::new(vec![0, 1])), 4000);

        let err = synth.synthesize_to_file("A. B.", &out).await.unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_coverage_threshold() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("a.mp3");
        let synth = ChunkedSynthesizer::new(Arc::new(Recorder::new(vec![0])), 4000).with_min_coverage(0.9);

        let err = synth.synthesize_to_file("Long first sentence here. B.", &out).await.unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_blank_text_never_calls_provider() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(Recorder::new(vec![]));
        let synth = ChunkedSynthesizer::new(provider.clone(), 4000);

        assert!(synth.synthesize_to_file("  ", &dir.path().join("a.mp3")).await.is_err());
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
