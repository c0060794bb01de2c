//! Provider response normalization.

use gateway_core::{CompletionResult, FinishReason, GatewayError, GatewayResult, ProviderResponse};
use uuid::Uuid;

/// Map a provider response onto a single-choice `CompletionResult`.
///
/// The retry loop only hands over responses with content; the check here
/// still rejects anything else.
///
/// # Errors
/// Returns `Internal` if the first choice has no non-empty content
pub fn normalize(response: &ProviderResponse, model: &str) -> GatewayResult<CompletionResult> {
    let content = response.first_content().ok_or_else(|| {
        GatewayError::internal("cannot normalize a provider response without content")
    })?;

    let id = response
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map_or_else(synthetic_id, String::from);

    Ok(CompletionResult {
        id,
        model: model.to_string(),
        content: content.to_string(),
        finish_reason: FinishReason::Stop,
    })
}

/// Completion id for responses that carry none
#[must_use]
pub fn synthetic_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{ProviderChoice, ProviderMessage};

    #[test]
    fn test_normalize_keeps_provider_id() {
        let response = ProviderResponse::with_content(Some("chatcmpl-abc"), "Hello!");
        let result = normalize(&response, "llama-3").expect("normalize");

        assert_eq!(result.id, "chatcmpl-abc");
        assert_eq!(result.model, "llama-3");
        assert_eq!(result.content, "Hello!");
        assert_eq!(result.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_missing_id_gets_synthetic() {
        let response = ProviderResponse::with_content(None, "Hello!");
        let result = normalize(&response, "llama-3").expect("normalize");
        assert!(result.id.starts_with("chatcmpl-"));
        assert!(result.id.len() > "chatcmpl-".len());

        let blank = ProviderResponse::with_content(Some(""), "Hello!");
        assert!(normalize(&blank, "llama-3")
            .expect("normalize")
            .id
            .starts_with("chatcmpl-"));
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let empty = ProviderResponse::with_content(Some("x"), "");
        assert!(matches!(
            normalize(&empty, "llama-3"),
            Err(GatewayError::Internal { .. })
        ));

        let no_message = ProviderResponse {
            id: None,
            choices: vec![ProviderChoice { message: None }],
            error: None,
        };
        assert!(normalize(&no_message, "llama-3").is_err());

        let no_content = ProviderResponse {
            id: None,
            choices: vec![ProviderChoice {
                message: Some(ProviderMessage { content: None }),
            }],
            error: None,
        };
        assert!(normalize(&no_content, "llama-3").is_err());
        assert!(normalize(&ProviderResponse::default(), "llama-3").is_err());
    }

    #[test]
    fn test_wire_shape_has_zero_usage() {
        let response = ProviderResponse::with_content(Some("chatcmpl-1"), "hi");
        let wire = normalize(&response, "llama-3")
            .expect("normalize")
            .into_response(1_700_000_000);
        assert_eq!(wire.choices.len(), 1);
        assert_eq!(wire.usage.total_tokens, 0);
        assert_eq!(wire.object, "chat.completion");
    }
}
