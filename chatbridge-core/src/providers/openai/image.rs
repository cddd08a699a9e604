//! Image generation model

use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use super::OpenAISettings;
use crate::http::RequestOptions;
use crate::providers::adapter::{GeneratedImage, ImageModel, ImageRequest, ImageResult};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const IMAGES_PATH: &str = "images/generations";

/// Model handle for `POST /images/generations`
pub struct OpenAIImageModel {
    model_id: String,
    provider: String,
    settings: Arc<OpenAISettings>,
}

impl OpenAIImageModel {
    pub(crate) fn new(model_id: impl Into<String>, settings: Arc<OpenAISettings>) -> Self {
        Self {
            model_id: model_id.into(),
            provider: settings.label("image"),
            settings,
        }
    }
}

#[async_trait]
impl ImageModel for OpenAIImageModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, request: &ImageRequest) -> ProviderResult<ImageResult> {
        if request.n == 0 {
            return Err(ProviderError::InvalidRequest(
                "Image count must be at least 1".to_string(),
            ));
        }

        let headers = self.settings.headers()?;
        let url = self.settings.url(IMAGES_PATH);
        let body = serde_json::to_value(ImageGenerationRequest {
            model: self.model_id.clone(),
            prompt: request.prompt.clone(),
            n: request.n,
            size: request.size.clone(),
            response_format: "b64_json".to_string(),
        })?;

        let (value, raw_response) = self
            .settings
            .http()
            .post_json(&url, &headers, &body, &RequestOptions::new())
            .await?;

        let response: ImageGenerationResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::ParseError(format!("Invalid image response: {}", e)))?;
        debug!("Generated {} image(s) with {}", response.data.len(), self.model_id);

        let images = response
            .data
            .into_iter()
            .map(|image| GeneratedImage {
                base64: image.b64_json,
                url: image.url,
                revised_prompt: image.revised_prompt,
            })
            .collect();

        Ok(ImageResult {
            images,
            raw_response: Some(raw_response),
            warnings: Vec::new(),
        })
    }
}
