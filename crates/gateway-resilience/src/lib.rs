//! # Gateway Resilience
//!
//! Resilience patterns for the ZG Inference Gateway:
//! - Bounded retry policy with a fixed inter-attempt delay and per-attempt timeout
//! - Pluggable classification of upstream error text (fee shortfall, transient, fatal)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod retry;

// Re-export main types
pub use classifier::{Classification, ErrorClassifier, PatternClassifier, DEFAULT_FEE_PATTERN};
pub use retry::{RetryConfig, RetryPolicy, RetryPolicyBuilder};
