//! OpenAI provider implementation
//!
//! `OpenAIProvider` holds connection settings and hands out model handles for
//! the chat completions, responses and image generation endpoints. The same
//! provider type talks to any OpenAI-compatible server, such as the local
//! chat backend.

mod chat;
mod image;
mod responses;
pub mod types;

pub use chat::OpenAIChatModel;
pub use image::OpenAIImageModel;
pub use responses::OpenAIResponsesModel;

use crate::config::{OpenAIConfig, SecretString};
use crate::http::HttpClient;
use crate::providers::error::{ProviderError, ProviderResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Connection settings shared by every model handle of a provider
#[derive(Clone)]
pub(crate) struct OpenAISettings {
    name: String,
    base_url: String,
    api_key: Option<SecretString>,
    organization: Option<String>,
    http: HttpClient,
}

impl OpenAISettings {
    /// Full URL for an endpoint path
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Provider label for a given API surface, e.g. "openai.chat"
    pub(crate) fn label(&self, surface: &str) -> String {
        format!("{}.{}", self.name, surface)
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Build request headers.
    ///
    /// A missing key is reported here, at call time, so registries can be
    /// built without credentials.
    pub(crate) fn headers(&self) -> ProviderResult<HashMap<String, String>> {
        let key = self
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::Authentication(format!(
                    "No API key configured for provider '{}'",
                    self.name
                ))
            })?;

        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", key.expose_secret()),
        );
        if let Some(org) = &self.organization {
            headers.insert("OpenAI-Organization".to_string(), org.clone());
        }
        Ok(headers)
    }
}

/// Factory for OpenAI model handles
#[derive(Clone)]
pub struct OpenAIProvider {
    settings: Arc<OpenAISettings>,
}

impl OpenAIProvider {
    /// Create a provider for an OpenAI-compatible server
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>, http: HttpClient) -> Self {
        Self {
            settings: Arc::new(OpenAISettings {
                name: "openai".to_string(),
                base_url: base_url.into(),
                api_key,
                organization: None,
                http,
            }),
        }
    }

    /// Create a provider from the `openai` configuration section
    pub fn from_config(config: &OpenAIConfig, http: HttpClient) -> Self {
        let provider = Self::new(config.base_url.clone(), config.api_key.clone(), http);
        match &config.organization {
            Some(org) => provider.with_organization(org.clone()),
            None => provider,
        }
    }

    /// Set the provider name used in model labels
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.settings).name = name.into();
        self
    }

    /// Set the organization header
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.settings).organization = Some(organization.into());
        self
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Model handle for the chat completions endpoint
    pub fn chat(&self, model_id: impl Into<String>) -> OpenAIChatModel {
        OpenAIChatModel::new(model_id, Arc::clone(&self.settings))
    }

    /// Model handle for the responses endpoint
    pub fn responses(&self, model_id: impl Into<String>) -> OpenAIResponsesModel {
        OpenAIResponsesModel::new(model_id, Arc::clone(&self.settings))
    }

    /// Model handle for the image generation endpoint
    pub fn image(&self, model_id: impl Into<String>) -> OpenAIImageModel {
        OpenAIImageModel::new(model_id, Arc::clone(&self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::adapter::{ImageModel, LanguageModel};

    fn provider(key: Option<&str>) -> OpenAIProvider {
        OpenAIProvider::new(
            "http://localhost:8000/",
            key.map(SecretString::new),
            HttpClient::new().unwrap(),
        )
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let provider = provider(Some("sk-test"));
        assert_eq!(
            provider.settings.url("chat/completions"),
            "http://localhost:8000/chat/completions"
        );
    }

    #[test]
    fn test_headers_require_key() {
        let err = provider(None).settings.headers().unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));

        let err = provider(Some("")).settings.headers().unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));
    }

    #[test]
    fn test_headers_include_organization() {
        let headers = provider(Some("sk-test"))
            .with_organization("org-1")
            .settings
            .headers()
            .unwrap();
        assert_eq!(headers["Authorization"], "Bearer sk-test");
        assert_eq!(headers["OpenAI-Organization"], "org-1");
    }

    #[test]
    fn test_model_labels() {
        let provider = provider(Some("sk-test")).with_name("backend");
        assert_eq!(provider.chat("gpt-4o-mini").provider(), "backend.chat");
        assert_eq!(provider.responses("gpt-4o-mini").provider(), "backend.responses");
        assert_eq!(provider.image("dall-e-3").provider(), "backend.image");
        assert_eq!(provider.image("dall-e-3").model_id(), "dall-e-3");
    }
}
