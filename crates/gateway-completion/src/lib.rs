//! # Gateway Completion
//!
//! The request path of the ZG Inference Gateway:
//! - `CompletionOrchestrator`: resolve, sign, call, settle and retry
//! - `normalize`: provider response to `CompletionResult`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod normalizer;
pub mod orchestrator;

pub use normalizer::{normalize, synthetic_id};
pub use orchestrator::{CompletionOrchestrator, InferenceAttempt, ModelListing};
