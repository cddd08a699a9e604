//! Provider registry
//!
//! Maps the logical model names used by the chat UI to concrete model handles.
//! Which handles sit behind the names depends on the configured environment:
//! test mode serves deterministic mocks, production mode serves the local chat
//! backend and OpenAI.

use crate::config::{AppConfig, BackendProtocol, Environment, SecretString};
use crate::http::HttpClient;
use crate::providers::adapter::{ImageModel, LanguageModel};
use crate::providers::backend::BackendChatModel;
use crate::providers::error::{ModelKind, ProviderError, ProviderResult};
use crate::providers::middleware::wrap_language_model;
use crate::providers::mock;
use crate::providers::openai::OpenAIProvider;
use crate::providers::reasoning::ExtractReasoningMiddleware;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// General chat
pub const CHAT_MODEL: &str = "chat-model";
/// Chat with separated reasoning
pub const CHAT_MODEL_REASONING: &str = "chat-model-reasoning";
/// Conversation titles
pub const TITLE_MODEL: &str = "title-model";
/// Document artifacts
pub const ARTIFACT_MODEL: &str = "artifact-model";
/// Image generation
pub const SMALL_MODEL: &str = "small-model";

fn redacted(key: Option<&SecretString>) -> String {
    key.map_or_else(|| "[NONE]".to_string(), SecretString::partial_redact)
}

/// Name-to-handle lookup for language and image models
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    language_models: BTreeMap<String, Arc<dyn LanguageModel>>,
    image_models: BTreeMap<String, Arc<dyn ImageModel>>,
}

impl ProviderRegistry {
    /// Start assembling a custom registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build the registry for the configured environment.
    ///
    /// No credentials are checked here. A model without a usable API key
    /// fails with `ProviderError::Authentication` when it is first called.
    pub fn from_config(config: &AppConfig) -> ProviderResult<Self> {
        let registry = match config.environment {
            Environment::Test => Self::test_models(),
            Environment::Production => Self::production_models(config)?,
        };

        info!(
            environment = ?config.environment,
            language_models = ?registry.language_model_names(),
            image_models = ?registry.image_model_names(),
            "Provider registry ready"
        );
        Ok(registry)
    }

    fn test_models() -> Self {
        Self::builder()
            .language_model(CHAT_MODEL, Arc::new(mock::chat_model()))
            .language_model(CHAT_MODEL_REASONING, Arc::new(mock::reasoning_model()))
            .language_model(TITLE_MODEL, Arc::new(mock::title_model()))
            .language_model(ARTIFACT_MODEL, Arc::new(mock::artifact_model()))
            .build()
    }

    fn production_models(config: &AppConfig) -> ProviderResult<Self> {
        let http = HttpClient::from_config(&config.connection)?;
        let openai = OpenAIProvider::from_config(&config.openai, http.clone());

        let backend_key = config
            .backend
            .api_key
            .clone()
            .or_else(|| config.openai.api_key.clone());
        debug!(
            backend_url = %config.backend.base_url,
            backend_key = %redacted(backend_key.as_ref()),
            openai_key = %redacted(config.openai.api_key.as_ref()),
            "Resolved production credentials"
        );
        let chat: Arc<dyn LanguageModel> = match config.backend.protocol {
            BackendProtocol::OpenaiChat => Arc::new(
                OpenAIProvider::new(config.backend.base_url.clone(), backend_key, http.clone())
                    .with_name("backend")
                    .chat(config.models.chat.clone()),
            ),
            BackendProtocol::Native => Arc::new(
                BackendChatModel::new(
                    config.backend.base_url.clone(),
                    config.models.chat.clone(),
                    http,
                )
                .with_api_key(backend_key),
            ),
        };

        let reasoning = wrap_language_model(
            Arc::new(openai.responses(config.models.reasoning.clone())),
            ExtractReasoningMiddleware::new(config.reasoning.tag_name.clone()),
        );

        Ok(Self::builder()
            .language_model(CHAT_MODEL, chat)
            .language_model(CHAT_MODEL_REASONING, reasoning)
            .language_model(
                TITLE_MODEL,
                Arc::new(openai.responses(config.models.title.clone())),
            )
            .language_model(
                ARTIFACT_MODEL,
                Arc::new(openai.responses(config.models.artifact.clone())),
            )
            .image_model(SMALL_MODEL, Arc::new(openai.image(config.models.image.clone())))
            .build())
    }

    /// Look up a language model by logical name
    pub fn language_model(&self, name: &str) -> ProviderResult<Arc<dyn LanguageModel>> {
        self.language_models
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NoSuchModel {
                kind: ModelKind::Language,
                name: name.to_string(),
            })
    }

    /// Look up an image model by logical name
    pub fn image_model(&self, name: &str) -> ProviderResult<Arc<dyn ImageModel>> {
        self.image_models
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NoSuchModel {
                kind: ModelKind::Image,
                name: name.to_string(),
            })
    }

    /// Registered language model names, sorted
    pub fn language_model_names(&self) -> Vec<&str> {
        self.language_models.keys().map(String::as_str).collect()
    }

    /// Registered image model names, sorted
    pub fn image_model_names(&self) -> Vec<&str> {
        self.image_models.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let language: BTreeMap<&str, String> = self
            .language_models
            .iter()
            .map(|(name, model)| {
                (
                    name.as_str(),
                    format!("{}:{}", model.provider(), model.model_id()),
                )
            })
            .collect();
        let image: BTreeMap<&str, String> = self
            .image_models
            .iter()
            .map(|(name, model)| {
                (
                    name.as_str(),
                    format!("{}:{}", model.provider(), model.model_id()),
                )
            })
            .collect();

        f.debug_struct("ProviderRegistry")
            .field("language_models", &language)
            .field("image_models", &image)
            .finish()
    }
}

/// Builder for creating registries
pub struct RegistryBuilder {
    registry: ProviderRegistry,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::default(),
        }
    }

    /// Register a language model, replacing any earlier one with the same name
    pub fn language_model(mut self, name: impl Into<String>, model: Arc<dyn LanguageModel>) -> Self {
        self.registry.language_models.insert(name.into(), model);
        self
    }

    /// Register an image model, replacing any earlier one with the same name
    pub fn image_model(mut self, name: impl Into<String>, model: Arc<dyn ImageModel>) -> Self {
        self.registry.image_models.insert(name.into(), model);
        self
    }

    /// Finish building
    pub fn build(self) -> ProviderRegistry {
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockLanguageModel;

    #[test]
    fn test_test_mode_has_no_image_models() {
        let registry = ProviderRegistry::from_config(&AppConfig::new(Environment::Test)).unwrap();
        assert_eq!(
            registry.language_model_names(),
            vec![ARTIFACT_MODEL, CHAT_MODEL, CHAT_MODEL_REASONING, TITLE_MODEL]
        );
        assert!(registry.image_model_names().is_empty());
        assert_eq!(registry.language_model(CHAT_MODEL).unwrap().provider(), "mock");
    }

    #[test]
    fn test_production_mode_wiring() {
        let registry =
            ProviderRegistry::from_config(&AppConfig::new(Environment::Production)).unwrap();

        let chat = registry.language_model(CHAT_MODEL).unwrap();
        assert_eq!(chat.provider(), "backend.chat");
        assert_eq!(chat.model_id(), "gpt-4o-mini");

        assert_eq!(
            registry.language_model(TITLE_MODEL).unwrap().provider(),
            "openai.responses"
        );
        assert_eq!(
            registry.language_model(CHAT_MODEL_REASONING).unwrap().provider(),
            "openai.responses"
        );
        assert_eq!(registry.image_model(SMALL_MODEL).unwrap().model_id(), "dall-e-3");
    }

    #[test]
    fn test_native_protocol_selects_backend_model() {
        let mut config = AppConfig::new(Environment::Production);
        config.backend.protocol = BackendProtocol::Native;

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.language_model(CHAT_MODEL).unwrap().provider(),
            "backend.native"
        );
    }

    #[test]
    fn test_unknown_names() {
        let registry = ProviderRegistry::from_config(&AppConfig::new(Environment::Test)).unwrap();

        let err = registry.language_model("gpt-5").err().unwrap();
        assert!(matches!(
            err,
            ProviderError::NoSuchModel {
                kind: ModelKind::Language,
                ..
            }
        ));

        let err = registry.image_model(SMALL_MODEL).err().unwrap();
        assert!(matches!(
            err,
            ProviderError::NoSuchModel {
                kind: ModelKind::Image,
                ..
            }
        ));
    }

    #[test]
    fn test_builder_replaces_duplicates() {
        let registry = ProviderRegistry::builder()
            .language_model("a", Arc::new(MockLanguageModel::from_text("first", &["1"])))
            .language_model("a", Arc::new(MockLanguageModel::from_text("second", &["2"])))
            .build();

        assert_eq!(registry.language_model_names(), vec!["a"]);
        assert_eq!(registry.language_model("a").unwrap().model_id(), "second");
    }

    #[test]
    fn test_debug_lists_handles() {
        let registry = ProviderRegistry::from_config(&AppConfig::new(Environment::Test)).unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("chat-model"));
        assert!(debug.contains("mock:"));
    }
}
