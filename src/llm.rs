// file: llm.rs

use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use crate::error::{AssistantError, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Seconds allowed to establish a connection. Whole requests have no time limit unless one is configured.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
        }
    }
}

/// A backend that turns one prompt into generated text.
///
/// The assistant makes exactly one call per operation and does not retry, so an
/// implementation should return remote failures as they are.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<LlmApiResult>;
}

#[derive(Serialize, Deserialize, PartialEq, Default, Clone)]
pub struct LlmApiResult {
    // The text generated by the model
    pub generated_text: String,
    // The count of input tokens used up for the prompt
    pub input_tokens_count: u64,
    // The count of generated tokens
    pub output_tokens_count: u64,
    // The reason for stopping text generation
    pub stop_reason: String,
    // The model used for generation
    pub model_used: String,
}

impl LlmApiResult {
    pub fn from_text(generated_text: impl Into<String>) -> LlmApiResult {
        LlmApiResult {
            generated_text: generated_text.into(),
            ..LlmApiResult::default()
        }
    }
}

impl fmt::Debug for LlmApiResult {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("LLM API Result\n")
            .field("\nLLM generated text", &format_args!("{}", self.generated_text))
            .field("\nInput tokens", &format_args!("{}", self.input_tokens_count))
            .field("\nOutput tokens", &format_args!("{}", self.output_tokens_count))
            .field("\nReason to stop generating", &format_args!("{}", self.stop_reason))
            .field("\nModel that generated this text", &format_args!("{}\n", self.model_used))
            .finish()
    }
}

/// Builds the HTTP client shared by all requests of one generator.
///
/// # Arguments
///
/// * `connect_timeout`: seconds allowed to establish a connection
/// * `fetch_timeout`: seconds allowed for a whole request, `None` for no limit
/// * `proxy_url`: optional HTTPS proxy
/// * `custom_headers`: headers sent with every request, e.g. the API key
///
/// returns: Result<reqwest::Client>
pub fn build_llm_api_client(connect_timeout: u64, fetch_timeout: Option<u64>, proxy_url: Option<&str>, custom_headers: Option<HeaderMap>) -> Result<reqwest::Client> {

    let pool_idle_timeout: u64 = connect_timeout.saturating_add(fetch_timeout.unwrap_or_default()).saturating_mul(5);
    let pool_max_idle_connections: usize = 1;

    let mut headers = custom_headers.unwrap_or_default();
    headers.insert(reqwest::header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut client_builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout))
        .default_headers(headers)
        .gzip(true)
        .pool_idle_timeout(Duration::from_secs(pool_idle_timeout))
        .pool_max_idle_per_host(pool_max_idle_connections);

    if let Some(fetch_timeout_secs) = fetch_timeout {
        client_builder = client_builder.timeout(Duration::from_secs(fetch_timeout_secs));
    }

    if let Some(proxy_url_str) = proxy_url {
        // if proxy is configured, then add proxy with https rule:
        let proxy_obj = reqwest::Proxy::https(proxy_url_str)
            .map_err(|e| AssistantError::Config(format!("Unable to use proxy {}: {}", proxy_url_str, e)))?;
        debug!("Using HTTPS proxy {}", proxy_url_str);
        client_builder = client_builder.proxy(proxy_obj);
    }

    let client = client_builder
        .build()
        .map_err(|e| AssistantError::Config(format!("Unable to build the REST API client: {}", e)))?;
    info!("Built generation API client, request timeout {:?}", fetch_timeout.map(Duration::from_secs));
    Ok(client)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_uses_api_field_names() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(json["maxOutputTokens"], 8192);
        assert_eq!(json["topK"], 64);
        assert!(json.get("topP").is_some());
        assert!(json.get("temperature").is_some());
    }

    #[test]
    fn test_build_client_with_and_without_proxy() {
        assert!(build_llm_api_client(10, Some(10), None, None).is_ok());
        assert!(build_llm_api_client(10, None, Some("http://127.0.0.1:3128"), None).is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let err = build_llm_api_client(10, None, Some("http://[::1"), None).unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
    }

    #[test]
    fn test_build_client_with_huge_timeout() {
        assert!(build_llm_api_client(DEFAULT_CONNECT_TIMEOUT_SECS, Some(u64::MAX), None, None).is_ok());
        assert!(build_llm_api_client(u64::MAX, None, None, None).is_ok());
    }

    #[test]
    fn test_result_from_text() {
        let result = LlmApiResult::from_text("bonjour");
        assert_eq!(result.generated_text, "bonjour");
        assert_eq!(result.output_tokens_count, 0);
    }
}
