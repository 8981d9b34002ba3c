// file: providers/google.rs

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::{AssistantError, Result};
use crate::llm::{build_llm_api_client, GenerationConfig, DEFAULT_CONNECT_TIMEOUT_SECS, LlmApiResult, TextGenerator};

const GOOG_API_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parts {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Contents {
    pub role: String,
    pub parts: Vec<Parts>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeminiRequestPayload {
    pub contents: Vec<Contents>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

/// Add headers for the Gemini API:
/// "x-goog-api-key: PUT-YOUR-API-KEY-HERE"
///
/// # Arguments
///
/// * `api_key`: The API key for the service
///
/// returns: Result<HeaderMap>
pub fn prepare_gemini_headers(api_key: &str) -> Result<HeaderMap> {
    let mut custom_headers = HeaderMap::new();
    let mut header_apikey_val = HeaderValue::from_str(api_key)
        .map_err(|_| AssistantError::Config("API key contains characters not allowed in an HTTP header".to_string()))?;
    header_apikey_val.set_sensitive(true);
    custom_headers.insert(GOOG_API_HEADER, header_apikey_val);
    Ok(custom_headers)
}

/// Prepare the JSON payload for one single-turn generation request.
///
/// # Arguments
///
/// * `prompt`: The prompt to the model.
/// * `generation_config`: temperature, sampling and output length settings
///
/// returns: GeminiRequestPayload
pub fn prepare_gemini_api_payload(prompt: &str, generation_config: &GenerationConfig) -> GeminiRequestPayload {
    GeminiRequestPayload {
        contents: vec![Contents {
            role: "user".to_string(),
            parts: vec![Parts { text: prompt.to_string() }],
        }],
        generation_config: *generation_config,
    }
}

/// Reads the generated text and usage figures out of a `generateContent` response body.
///
/// The text of all parts of the first candidate is concatenated. A body carrying an
/// `error` object, or one without any candidate text, is an error.
pub fn extract_gemini_result(json: &Value) -> Result<LlmApiResult> {
    if let Some(resp_error) = json.get("error") {
        let message = resp_error.get("message").and_then(Value::as_str).unwrap_or_default();
        let status = resp_error
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| StatusCode::from_u16(code as u16).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Err(AssistantError::Api { status, message: message.to_string() });
    }

    let mut llm_response = LlmApiResult::default();
    if let Some(first_candidate) = json.get("candidates").and_then(|c| c.get(0)) {
        if let Some(parts) = first_candidate.pointer("/content/parts").and_then(Value::as_array) {
            llm_response.generated_text = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>();
        }
        if let Some(finish_reason) = first_candidate.get("finishReason").and_then(Value::as_str) {
            llm_response.stop_reason = finish_reason.to_string();
        }
    }
    if llm_response.generated_text.is_empty() {
        return Err(AssistantError::EmptyResponse);
    }

    if let Some(resp_usage_metadata) = json.get("usageMetadata") {
        if let Some(prompt_token_count) = resp_usage_metadata.get("promptTokenCount") {
            llm_response.input_tokens_count = prompt_token_count.as_u64().unwrap_or_default();
        }
        if let Some(candidates_token_count) = resp_usage_metadata.get("candidatesTokenCount") {
            llm_response.output_tokens_count = candidates_token_count.as_u64().unwrap_or_default();
        }
    }
    // "modelVersion": "gemini-1.5-flash-001"
    if let Some(model_version) = json.get("modelVersion").and_then(Value::as_str) {
        llm_response.model_used = model_version.to_string();
    }
    Ok(llm_response)
}

/// Posts the prompt payload to the Gemini `generateContent` endpoint and retrieves back the result.
/// Generates a URL of the format:
/// https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent
///
/// # Arguments
///
/// * `client`: HTTP client carrying the API key header
/// * `base_url`: The models endpoint of the service
/// * `model_name`: The model to generate with
/// * `json_payload`: The prompt and generation settings
///
/// returns: Result<LlmApiResult>
pub async fn http_post_json_gemini(client: &reqwest::Client, base_url: &str, model_name: &str, json_payload: &GeminiRequestPayload) -> Result<LlmApiResult> {

    let api_url = format!("{}/{}:generateContent", base_url.trim_end_matches('/'), model_name);
    debug!("Gemini API: posting prompt to {}", api_url);

    let resp = client.post(api_url).json(json_payload).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        debug!("Gemini API: received response status {:?}: {}", status, body);
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| json.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "Unauthorised".to_string(),
                StatusCode::NOT_FOUND => "Service not found".to_string(),
                StatusCode::PAYLOAD_TOO_LARGE => "Request payload is too large".to_string(),
                StatusCode::TOO_MANY_REQUESTS => "Too many requests. Exceeded the Provisioned Throughput.".to_string(),
                s => format!("Received response status: {s:?}"),
            });
        return Err(AssistantError::Api { status, message });
    }

    let json = resp.json::<Value>().await?;
    debug!("Gemini API: model response:\n{:?}", json);
    extract_gemini_result(&json)
}

/// Text generation backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    api_client: reqwest::Client,
    base_url: String,
    model_name: String,
    generation_config: GenerationConfig,
}

impl GeminiGenerator {

    /// Prepares the HTTP client; no request is made here.
    ///
    /// Without `request_timeout_secs` a request may take as long as the service needs.
    pub fn build(api_key: &str, model_name: &str, base_url: &str, generation_config: GenerationConfig, request_timeout_secs: Option<u64>, proxy_server: Option<&str>) -> Result<GeminiGenerator> {
        let gemini_headers = prepare_gemini_headers(api_key)?;
        let api_client = build_llm_api_client(DEFAULT_CONNECT_TIMEOUT_SECS, request_timeout_secs, proxy_server, Some(gemini_headers))?;
        Ok(GeminiGenerator {
            api_client,
            base_url: base_url.to_string(),
            model_name: model_name.to_string(),
            generation_config,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate_text(&self, prompt: &str) -> Result<LlmApiResult> {
        let json_payload = prepare_gemini_api_payload(prompt, &self.generation_config);
        http_post_json_gemini(&self.api_client, &self.base_url, &self.model_name, &json_payload).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let config = GenerationConfig { temperature: 0.2, top_p: 0.9, top_k: 32, max_output_tokens: 1024 };
        let payload = prepare_gemini_api_payload("Why is the sky blue?", &config);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Why is the sky blue?");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["generationConfig"]["topK"], 32);
    }

    #[test]
    fn test_headers_carry_api_key() {
        let headers = prepare_gemini_headers("abc123").unwrap();
        assert_eq!(headers.get("x-goog-api-key").unwrap().to_str().unwrap(), "abc123");
        assert!(headers.get("x-goog-api-key").unwrap().is_sensitive());
        assert!(prepare_gemini_headers("bad\nkey").is_err());
    }

    #[test]
    fn test_extract_text_and_usage() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Rayleigh "}, {"text": "scattering."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10},
            "modelVersion": "gemini-1.5-flash-001"
        });
        let result = extract_gemini_result(&body).unwrap();
        assert_eq!(result.generated_text, "Rayleigh scattering.");
        assert_eq!(result.input_tokens_count, 7);
        assert_eq!(result.output_tokens_count, 3);
        assert_eq!(result.stop_reason, "STOP");
        assert_eq!(result.model_used, "gemini-1.5-flash-001");
    }

    #[test]
    fn test_extract_error_body() {
        let body = json!({"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}});
        match extract_gemini_result(&body) {
            Err(AssistantError::Api { status, message }) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_without_candidates() {
        let body = json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}});
        assert!(matches!(extract_gemini_result(&body), Err(AssistantError::EmptyResponse)));
    }

    #[test]
    fn test_build_generator() {
        let generator = GeminiGenerator::build("key", "gemini-1.5-pro", "https://example.invalid/v1beta/models", GenerationConfig::default(), Some(30), None).unwrap();
        assert_eq!(generator.model_name(), "gemini-1.5-pro");
        assert_eq!(generator.generation_config().max_output_tokens, 8192);
    }
}
