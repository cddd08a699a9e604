//! Language model middleware
//!
//! A middleware can rewrite the request before it reaches the model and
//! post-process what comes back, for both generate and stream calls.

use crate::protocol::ChatRequest;
use crate::providers::adapter::{GenerateResult, LanguageModel, StreamResult};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Hooks applied around a wrapped model. Every hook defaults to pass-through.
pub trait LanguageModelMiddleware: Send + Sync {
    /// Rewrite the request before it reaches the model
    fn transform_params(&self, request: ChatRequest) -> ChatRequest {
        request
    }

    /// Post-process a completed generate call
    fn wrap_generate(&self, result: GenerateResult) -> ProviderResult<GenerateResult> {
        Ok(result)
    }

    /// Post-process a stream call. Should only touch `result.stream`.
    fn wrap_stream(&self, result: StreamResult) -> StreamResult {
        result
    }
}

/// A model with a middleware applied
pub struct WrappedLanguageModel {
    model: Arc<dyn LanguageModel>,
    middleware: Arc<dyn LanguageModelMiddleware>,
}

impl WrappedLanguageModel {
    /// Wrap `model` with `middleware`
    pub fn new(model: Arc<dyn LanguageModel>, middleware: Arc<dyn LanguageModelMiddleware>) -> Self {
        Self { model, middleware }
    }
}

#[async_trait]
impl LanguageModel for WrappedLanguageModel {
    fn provider(&self) -> &str {
        self.model.provider()
    }

    fn model_id(&self) -> &str {
        self.model.model_id()
    }

    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult> {
        let request = self.middleware.transform_params(request.clone());
        let result = self.model.do_generate(&request).await?;
        self.middleware.wrap_generate(result)
    }

    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult> {
        let request = self.middleware.transform_params(request.clone());
        let result = self.model.do_stream(&request).await?;
        Ok(self.middleware.wrap_stream(result))
    }
}

/// Wrap a model with a middleware, returning a registry-ready handle
pub fn wrap_language_model(
    model: Arc<dyn LanguageModel>,
    middleware: impl LanguageModelMiddleware + 'static,
) -> Arc<dyn LanguageModel> {
    Arc::new(WrappedLanguageModel::new(model, Arc::new(middleware)))
}
