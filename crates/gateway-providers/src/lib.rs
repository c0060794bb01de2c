//! # Gateway Providers
//!
//! HTTP clients for the ZG Inference Gateway's external collaborators:
//! - `HttpBroker`: the marketplace broker sidecar (service listing, request
//!   signing, fee settlement)
//! - `HttpInferenceClient`: OpenAI-style chat completion calls against a
//!   provider endpoint

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod inference;

mod http_error;

// Re-export main types
pub use broker::{HttpBroker, HttpBrokerConfig};
pub use inference::{HttpInferenceClient, HttpInferenceConfig};
