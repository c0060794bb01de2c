//! # Gateway Routing
//!
//! Service discovery and model resolution for the ZG Inference Gateway.
//!
//! This crate provides:
//! - Service directories backed by the marketplace broker
//! - An atomically swapped, read-mostly service cache
//! - Exact-match model resolution with refresh-on-miss

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod directory;
pub mod resolver;

// Re-export main types
pub use cache::{CacheSnapshot, ServiceCache};
pub use directory::{BrokerDirectory, PinnedDirectory, ServiceDirectory};
pub use resolver::{ModelResolver, ResolvedService};
