//! Classification of upstream error text.
//!
//! Providers report an unpaid fee only as free-form text such as
//! `"settleFee: expected 2.0 A0GI"`. The format is not formally specified,
//! so the parsing rule sits behind [`ErrorClassifier`] and the retry loop
//! only ever sees a [`Classification`].

use gateway_core::FeeAmount;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Pattern for the fee-shortfall indicator; group 1 is the amount
pub const DEFAULT_FEE_PATTERN: &str = r"(?i)expected\s+([0-9]+(?:\.[0-9]+)?)\s*A0GI";

#[allow(clippy::expect_used)]
static DEFAULT_FEE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_FEE_PATTERN).expect("default fee pattern compiles"));

/// What an upstream error means for the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Retrying cannot help
    Fatal,
    /// Settle `amount` with the provider, then retry
    FeeShortfall(FeeAmount),
    /// Retry after the usual delay
    Transient,
}

/// Maps upstream error text to a [`Classification`]
pub trait ErrorClassifier: Send + Sync {
    /// Classify one error message
    fn classify(&self, error_text: &str) -> Classification;
}

/// Regex-based classifier
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    fee_pattern: Regex,
    fatal_patterns: Vec<Regex>,
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self {
            fee_pattern: DEFAULT_FEE_REGEX.clone(),
            fatal_patterns: Vec::new(),
        }
    }
}

impl PatternClassifier {
    /// Classifier with the default fee pattern and no fatal patterns
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fee pattern; capture group 1 must hold the amount
    ///
    /// # Errors
    /// Returns error if the pattern does not compile
    pub fn with_fee_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.fee_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    /// Treat errors matching `pattern` as fatal
    ///
    /// # Errors
    /// Returns error if the pattern does not compile
    pub fn with_fatal_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.fatal_patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Extract the expected fee from error text, if present
    #[must_use]
    pub fn extract_fee(&self, error_text: &str) -> Option<FeeAmount> {
        let raw = self.fee_pattern.captures(error_text)?.get(1)?.as_str();
        match FeeAmount::parse(raw) {
            Ok(amount) => Some(amount),
            Err(e) => {
                warn!(raw = %raw, error = %e, "Fee pattern matched a non-decimal amount");
                None
            }
        }
    }
}

impl ErrorClassifier for PatternClassifier {
    fn classify(&self, error_text: &str) -> Classification {
        if let Some(amount) = self.extract_fee(error_text) {
            return Classification::FeeShortfall(amount);
        }
        if self.fatal_patterns.iter().any(|p| p.is_match(error_text)) {
            return Classification::Fatal;
        }
        Classification::Transient
    }
}
