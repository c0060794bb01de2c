//! # Gateway Core
//!
//! Core types, traits, and error handling for the ZG Inference Gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - OpenAI-compatible request and response types
//! - Marketplace service records and fee amounts
//! - The `Broker` and `InferenceTransport` capability traits
//! - The `GatewayError` taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod error;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use broker::{
    Broker, FeeAmount, InferenceBody, InferenceMessage, InferenceTransport, RequestHeaders,
    ServiceMetadata, ServiceRecord,
};
pub use error::{GatewayError, GatewayResult};
pub use request::{flatten_messages, ChatCompletionRequest, ChatMessage, MessageRole};
pub use response::{
    ChatCompletionResponse, Choice, CompletionResult, FinishReason, ModelObject, ModelsResponse,
    ProviderChoice, ProviderMessage, ProviderResponse, ResponseMessage, Usage,
};
