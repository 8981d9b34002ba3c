// file: assistant.rs

use std::fmt;
use std::sync::RwLock;
use config::{Config, ConfigError};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::error::{AssistantError, Result};
use crate::languages::{Language, SummaryLength, SummaryStyle};
use crate::llm::{GenerationConfig, TextGenerator, DEFAULT_API_URL, DEFAULT_MODEL};
use crate::prompts::{fill_placeholders, prompt_catalog, PromptCatalog, PromptTemplate, Substitution, KEYPOINTS_PROMPT, SUMMARIZE_PROMPT, TRANSLATE_PROMPT};
use crate::providers::google::GeminiGenerator;

/// Environment variable consulted for the API key when none is passed explicitly.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MAX_KEY_POINTS: usize = 5;

static GLOBAL_API_KEY: RwLock<Option<String>> = RwLock::new(None);

/// Custom chat emoji markup: `<:name:id>` or animated `<a:name:id>`, with an 18 digit id.
static CUSTOM_EMOJI: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a?:[A-Za-z0-9_]+:[0-9]{18}>").expect("custom emoji pattern"));
static CLEANED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cleaned:[ \t]*(.*)").expect("cleaned line pattern"));
static TRANSLATED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)translated:[ \t]*(.*)").expect("translated line pattern"));

/// Sets the process-wide API key, the last fallback when building an [`Assistant`].
pub fn set_global_api_key(api_key: impl Into<String>) {
    let mut slot = GLOBAL_API_KEY.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(api_key.into());
}

pub fn clear_global_api_key() {
    let mut slot = GLOBAL_API_KEY.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

fn global_api_key() -> Option<String> {
    GLOBAL_API_KEY.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// First non-empty key among explicit, environment and global, in that order.
fn pick_api_key(explicit: Option<&str>, from_env: Option<String>, global: Option<String>) -> Option<String> {
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(from_env)
        .chain(global)
        .find(|key| !key.trim().is_empty())
}

/// Resolves the API key from the explicit value, then the environment variable
/// `env_var`, then the process-global key.
pub fn resolve_api_key(explicit: Option<&str>, env_var: &str) -> Result<String> {
    pick_api_key(explicit, std::env::var(env_var).ok(), global_api_key()).ok_or(AssistantError::MissingApiKey)
}

#[derive(Clone)]
pub struct AssistantOptions {
    /// Explicit API key; takes precedence over the environment and the global key.
    pub api_key: Option<String>,
    /// Environment variable to read the API key from.
    pub api_key_env: String,
    pub model: String,
    pub generation_config: GenerationConfig,
    pub base_url: String,
    /// Limit for a whole request; `None` leaves timeouts to the caller.
    pub timeout_secs: Option<u64>,
    pub proxy: Option<String>,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        AssistantOptions {
            api_key: None,
            api_key_env: API_KEY_ENV_VAR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation_config: GenerationConfig::default(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: None,
            proxy: None,
        }
    }
}

impl fmt::Debug for AssistantOptions {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("AssistantOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("generation_config", &self.generation_config)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl AssistantOptions {

    /// Reads the options from the `[llm_apis."<service>"]` section of a configuration.
    ///
    /// Entries that are absent keep their default value:
    ///
    /// <tt>
    ///
    /// [llm_apis."gemini"]
    ///
    /// model_name = "gemini-1.5-flash"
    ///
    /// temperature = 0.2
    ///
    /// top_p = 0.95
    ///
    /// top_k = 64
    ///
    /// max_gen_tokens = 2048
    ///
    /// api_url = "https://generativelanguage.googleapis.com/v1beta/models"
    ///
    /// model_api_timeout = 60
    ///
    /// </tt>
    pub fn from_config(app_config: &Config, service: &str) -> Result<AssistantOptions> {
        let key = |name: &str| format!("llm_apis.{}.{}", service, name);
        let mut options = AssistantOptions::default();

        if let Some(api_key) = config_entry::<String>(app_config, &key("api_key"))? {
            options.api_key = Some(api_key);
        }
        if let Some(model) = config_entry::<String>(app_config, &key("model_name"))? {
            options.model = model;
        }
        if let Some(temperature) = config_entry::<f32>(app_config, &key("temperature"))? {
            options.generation_config.temperature = temperature;
        }
        if let Some(top_p) = config_entry::<f32>(app_config, &key("top_p"))? {
            options.generation_config.top_p = top_p;
        }
        if let Some(top_k) = config_entry::<u32>(app_config, &key("top_k"))? {
            options.generation_config.top_k = top_k;
        }
        if let Some(max_gen_tokens) = config_entry::<u32>(app_config, &key("max_gen_tokens"))? {
            options.generation_config.max_output_tokens = max_gen_tokens;
        }
        if let Some(api_url) = config_entry::<String>(app_config, &key("api_url"))? {
            options.base_url = api_url;
        }
        if let Some(timeout) = config_entry::<u64>(app_config, &key("model_api_timeout"))? {
            options.timeout_secs = Some(timeout);
        }
        options.proxy = config_entry::<String>(app_config, &key("proxy"))?;
        Ok(options)
    }
}

fn config_entry<T: DeserializeOwned>(app_config: &Config, key: &str) -> Result<Option<T>> {
    match app_config.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub length: SummaryLength,
    pub style: SummaryStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResult {
    /// The message as tidied up by the model, in its original language.
    pub cleaned: String,
    pub translated: String,
}

/// Convenience operations over a text generation backend.
pub struct Assistant {
    generator: Box<dyn TextGenerator>,
    prompts: Option<PromptCatalog>,
}

impl fmt::Debug for Assistant {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Assistant")
            .field("custom_prompts", &self.prompts.as_ref().map(PromptCatalog::names))
            .finish_non_exhaustive()
    }
}

impl Assistant {

    /// Builds an assistant backed by the Gemini API.
    ///
    /// Fails with [`AssistantError::MissingApiKey`] before any network access when no
    /// API key can be found.
    pub fn new(options: AssistantOptions) -> Result<Assistant> {
        let api_key = resolve_api_key(options.api_key.as_deref(), &options.api_key_env)?;
        let generator = GeminiGenerator::build(
            &api_key,
            &options.model,
            &options.base_url,
            options.generation_config,
            options.timeout_secs,
            options.proxy.as_deref(),
        )?;
        debug!("Assistant ready, model {}", options.model);
        Ok(Assistant::with_generator(generator))
    }

    /// Builds an assistant around any text generation backend.
    pub fn with_generator(generator: impl TextGenerator + 'static) -> Assistant {
        Assistant {
            generator: Box::new(generator),
            prompts: None,
        }
    }

    /// Uses `catalog` instead of the process-wide prompt catalog.
    pub fn with_prompt_catalog(mut self, catalog: PromptCatalog) -> Assistant {
        self.prompts = Some(catalog);
        self
    }

    fn prompt_template(&self, name: &str) -> Result<&PromptTemplate> {
        let catalog = match &self.prompts {
            Some(catalog) => catalog,
            None => prompt_catalog()?,
        };
        catalog.get(name).ok_or_else(|| AssistantError::MissingPrompt(name.to_string()))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let llm_response = self.generator.generate_text(prompt).await?;
        debug!("Generated {} characters, {} output tokens", llm_response.generated_text.len(), llm_response.output_tokens_count);
        Ok(llm_response.generated_text)
    }

    /// Sends `text` to the model as is and returns the generated text verbatim.
    pub async fn ask(&self, text: &str) -> Result<String> {
        self.generate(text).await
    }

    /// Summarizes `text` in `language` with the requested length and style.
    pub async fn summarize(&self, text: &str, language: Language, options: SummaryOptions) -> Result<String> {
        let template = self.prompt_template(SUMMARIZE_PROMPT)?;
        let prompt = fill_placeholders(&template.template, &[
            Substitution::First("{language}", language.display_name()),
            Substitution::First("{length}", options.length.phrase()),
            Substitution::First("{style}", options.style.as_str()),
            Substitution::First("{text}", text),
        ]);
        self.generate(&prompt).await
    }

    /// Extracts at most `max_points` key points of `text`, written in `language`.
    pub async fn get_key_points(&self, text: &str, language: Language, max_points: usize) -> Result<String> {
        let template = self.prompt_template(KEYPOINTS_PROMPT)?;
        let count = max_points.to_string();
        let prompt = fill_placeholders(&template.template, &[
            Substitution::First("{count}", &count),
            Substitution::First("{language}", language.display_name()),
            Substitution::First("{text}", text),
        ]);
        self.generate(&prompt).await
    }

    /// Cleans up a chat message and translates it to `target_language`.
    ///
    /// Custom emoji markup is removed before the message is sent. The model must
    /// answer with a `Cleaned:` and a `Translated:` line, otherwise the call fails
    /// with [`AssistantError::MalformedResponse`].
    pub async fn translate(&self, text: &str, target_language: Language, from_language: Option<Language>) -> Result<TranslateResult> {
        let cleaned_input = strip_custom_emoji(text);
        let template = self.prompt_template(TRANSLATE_PROMPT)?;
        let from_name = from_language.map(|lang| lang.display_name()).unwrap_or("");
        let prompt = fill_placeholders(&template.template, &[
            Substitution::All("{targetLanguage}", target_language.display_name()),
            Substitution::All("{fromLanguage}", from_name),
            Substitution::First("{text}", &cleaned_input),
        ]);
        let response = self.generate(&prompt).await?;
        parse_translation_response(response.trim())
    }
}

/// Removes custom emoji markup such as `<a:wave:123456789012345678>` and trims the result.
pub fn strip_custom_emoji(text: &str) -> String {
    CUSTOM_EMOJI.replace_all(text, "").trim().to_string()
}

/// Reads the `Cleaned:` and `Translated:` lines out of a translation response.
pub fn parse_translation_response(response: &str) -> Result<TranslateResult> {
    let cleaned = labelled_value(&CLEANED_LINE, response);
    let translated = labelled_value(&TRANSLATED_LINE, response);
    match (cleaned, translated) {
        (Some(cleaned), Some(translated)) => Ok(TranslateResult { cleaned, translated }),
        (None, _) => Err(AssistantError::MalformedResponse(format!("no 'Cleaned:' line in {:?}", response))),
        (_, None) => Err(AssistantError::MalformedResponse(format!("no 'Translated:' line in {:?}", response))),
    }
}

fn labelled_value(pattern: &Regex, response: &str) -> Option<String> {
    let captures = pattern.captures(response)?;
    let value = captures.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
