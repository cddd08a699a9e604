//! Model providers and the registry that names them
//!
//! This module defines the model traits, the concrete OpenAI and native
//! backend models, test-mode mocks, middleware, and `ProviderRegistry`, which
//! maps the UI's logical model names onto all of them.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod middleware;
pub mod mock;
pub mod openai;
pub mod reasoning;
pub mod registry;

pub use adapter::{
    GenerateResult, GeneratedImage, ImageModel, ImageRequest, ImageResult, LanguageModel,
    PartStream, RawCall, RawResponse, StreamResult,
};
pub use backend::BackendChatModel;
pub use error::{ModelKind, ProviderError, ProviderResult};
pub use middleware::{wrap_language_model, LanguageModelMiddleware, WrappedLanguageModel};
pub use mock::MockLanguageModel;
pub use openai::OpenAIProvider;
pub use reasoning::ExtractReasoningMiddleware;
pub use registry::{
    ProviderRegistry, RegistryBuilder, ARTIFACT_MODEL, CHAT_MODEL, CHAT_MODEL_REASONING,
    SMALL_MODEL, TITLE_MODEL,
};
