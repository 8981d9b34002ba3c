// file: error.rs

use std::path::PathBuf;
use reqwest::StatusCode;
use thiserror::Error;

/// Every failure surfaced by the assistant and its providers.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No API key in the options, the environment or the process-global slot.
    #[error("no API key: pass one explicitly, set the environment variable, or call set_global_api_key")]
    MissingApiKey,

    /// The prompt catalog has no template with this name.
    #[error("prompt template '{0}' not found in the prompt catalog")]
    MissingPrompt(String),

    #[error("unable to read prompt catalog {path}: {source}")]
    PromptCatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt catalog is not valid JSON: {0}")]
    PromptCatalogFormat(#[source] serde_json::Error),

    /// Invalid settings, e.g. a wrongly typed config entry or an unusable proxy url.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network or protocol failure talking to the generation service.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status or an error body.
    #[error("generation API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("generation API did not generate any text")]
    EmptyResponse,

    /// The model answered, but not in the shape the operation expects.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl AssistantError {
    /// True for failures caused by setup rather than by the remote call or its output.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AssistantError::MissingApiKey
                | AssistantError::MissingPrompt(_)
                | AssistantError::PromptCatalogIo { .. }
                | AssistantError::PromptCatalogFormat(_)
                | AssistantError::Config(_)
        )
    }
}

impl From<config::ConfigError> for AssistantError {
    fn from(e: config::ConfigError) -> Self {
        AssistantError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_grouping() {
        assert!(AssistantError::MissingApiKey.is_configuration());
        assert!(AssistantError::MissingPrompt("keypoints".to_string()).is_configuration());
        assert!(!AssistantError::EmptyResponse.is_configuration());
        assert!(!AssistantError::MalformedResponse("no label".to_string()).is_configuration());
        let api_err = AssistantError::Api { status: StatusCode::TOO_MANY_REQUESTS, message: "quota".to_string() };
        assert!(!api_err.is_configuration());
    }

    #[test]
    fn test_missing_prompt_message_names_template() {
        let err = AssistantError::MissingPrompt("translate".to_string());
        assert!(err.to_string().contains("'translate'"));
    }
}
