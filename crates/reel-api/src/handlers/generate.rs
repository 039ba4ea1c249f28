//! Multi-scene generation endpoint.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use reel_models::{parse_scene_list, Category, LengthMode, SlotId};
use reel_pipeline::{PipelineRequest, UploadedMedia};
use serde::Serialize;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::public_url::video_url;
use crate::state::AppState;

/// Decoded multipart form.
#[derive(Debug, Default, Validate)]
pub struct GenerateForm {
    #[validate(length(max = 500, message = "topic must be at most 500 characters"))]
    pub topic: String,
    pub category: String,
    /// `short` or `long`; missing or empty means short
    pub length: Option<String>,
    /// JSON list of `{name, details}`
    pub scenes: Option<String>,
    pub uploads: Vec<(SlotId, UploadedMedia)>,
}

impl GenerateForm {
    pub fn into_request(self) -> ApiResult<PipelineRequest> {
        let mode = match self.length.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<LengthMode>()
                .map_err(|e| ApiError::validation(e.to_string()))?,
            None => LengthMode::Short,
        };

        let scenes = match self.scenes.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_scene_list(raw).map_err(|e| ApiError::validation(e.to_string()))?,
            None => Vec::new(),
        };

        let mut request = PipelineRequest::new(
            self.topic.trim(),
            Category::from_label(&self.category),
            mode,
            scenes,
        );

        for (slot, upload) in self.uploads {
            if let SlotId::Scene(index) = slot {
                if index >= request.scenes.len() {
                    warn!(field = %slot.form_key(), "Ignoring upload for a scene that does not exist");
                    continue;
                }
            }
            request = request.with_upload(slot, upload);
        }

        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub video_url: String,
}

/// POST /generate-multi-scene
pub async fn generate_multi_scene(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<GenerateResponse>> {
    let form = read_form(multipart).await?;
    form.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let request = form.into_request()?;
    let mode = request.mode;

    let timeout = state.config.generate_timeout;
    let outcome = match tokio::time::timeout(timeout, state.pipeline.run(request)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            metrics::record_generate(e.code(), mode.as_str());
            return Err(e.into());
        }
        Err(_) => {
            metrics::record_generate("TIMEOUT", mode.as_str());
            return Err(ApiError::Timeout(timeout.as_secs()));
        }
    };
    metrics::record_generate("success", mode.as_str());

    let file_name = outcome
        .artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ApiError::internal("artifact path has no file name"))?;

    let video_url = video_url(
        &headers,
        state.config.public_base_url.as_deref(),
        state.config.port,
        file_name,
    );

    info!(
        request_id = %outcome.request_id,
        rendered = outcome.rendered_count(),
        skipped = ?outcome.failed_slots(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Video ready"
    );

    Ok(Json(GenerateResponse {
        status: "success",
        video_url,
    }))
}

async fn read_form(mut multipart: Multipart) -> ApiResult<GenerateForm> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "topic" => form.topic = field.text().await.map_err(multipart_error)?,
            "category" => form.category = field.text().await.map_err(multipart_error)?,
            "type" => form.length = Some(field.text().await.map_err(multipart_error)?),
            "scenes" => form.scenes = Some(field.text().await.map_err(multipart_error)?),
            other => match SlotId::from_form_key(other) {
                Some(slot) => {
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(multipart_error)?;
                    if data.is_empty() {
                        continue;
                    }
                    metrics::record_upload_bytes(data.len());
                    form.uploads.push((slot, UploadedMedia::new(file_name, data)));
                }
                None => debug!(field = other, "Ignoring unknown form field"),
            },
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(length: Option<&str>, scenes: Option<&str>) -> GenerateForm {
        GenerateForm {
            topic: "  Best heist films  ".to_string(),
            category: "Movie".to_string(),
            length: length.map(str::to_string),
            scenes: scenes.map(str::to_string),
            uploads: Vec::new(),
        }
    }

    #[test]
    fn test_missing_or_empty_type_means_short() {
        let request = form(None, None).into_request().unwrap();
        assert_eq!(request.mode, LengthMode::Short);
        assert_eq!(request.topic, "Best heist films");
        assert_eq!(request.category, Category::Movie);

        let request = form(Some("  "), None).into_request().unwrap();
        assert_eq!(request.mode, LengthMode::Short);

        let request = form(Some("long"), None).into_request().unwrap();
        assert_eq!(request.mode, LengthMode::Long);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        let err = form(Some("medium"), None).into_request().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_invalid_scenes_are_rejected() {
        let err = form(None, Some("{not json")).into_request().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_uploads_for_unknown_scenes_are_dropped() {
        let mut f = form(None, Some(r#"[{"name":"Heat"}]"#));
        f.uploads = vec![
            (SlotId::Intro, UploadedMedia::new(Some("a.png".into()), vec![1u8])),
            (SlotId::Scene(0), UploadedMedia::new(Some("b.png".into()), vec![2u8])),
            (SlotId::Scene(3), UploadedMedia::new(Some("c.png".into()), vec![3u8])),
        ];

        let request = f.into_request().unwrap();
        assert_eq!(request.uploads.len(), 2);
        assert!(request.uploads.contains_key(&SlotId::Scene(0)));
        assert!(!request.uploads.contains_key(&SlotId::Scene(3)));
    }

    #[test]
    fn test_overlong_topic_fails_validation() {
        let mut f = form(None, None);
        f.topic = "x".repeat(501);
        assert!(f.validate().is_err());
    }
}
