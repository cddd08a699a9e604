//! Protocol module for chat request and streaming structures
//!
//! This module defines the data models shared by every provider:
//! - Provider-agnostic chat requests
//! - The backend's native streaming chunk shape
//! - The standardized stream parts consumed by the UI layer
//! - The line encoding of those parts for the UI data stream

pub mod data_stream;
pub mod stream;
pub mod types;

pub use stream::{BackendChunk, FinishReason, StreamPart, Usage};
pub use types::{ChatRequest, Message, MessageRole};
