//! # genai-assist - convenience helpers over a text generation API
//!
//! Wraps the Gemini "generate content" API behind four operations:
//!   - `ask`: send a question as is and get the generated text back
//!   - `summarize`: summarize a text in a language, length and style
//!   - `get_key_points`: extract the key points of a text
//!   - `translate`: clean up a chat message and translate it
//!
//! It also ships a locale to language table (see [`languages`]) and prompt templates
//! loaded once from `data/prompts.json` (see [`prompts`]).
//!
//! # Quick Start:
//!
//! ```no_run
//! use genai_assist::{Assistant, AssistantOptions, Language, SummaryOptions};
//!
//! # async fn run() -> Result<(), genai_assist::AssistantError> {
//! let assistant = Assistant::new(AssistantOptions::default())?;
//! let answer = assistant.ask("How is a rainbow created in the sky? Respond very concisely.").await?;
//! println!("---Answer---\n{}", answer);
//!
//! let summary = assistant.summarize("Some long article...", Language::En, SummaryOptions::default()).await?;
//! let result = assistant.translate("salut tout le monde", Language::En, Some(Language::Fr)).await?;
//! println!("{} / {}", summary, result.translated);
//! # Ok(())
//! # }
//! ```
//!
//! By default, the api key is picked up from the `GEMINI_API_KEY` environment variable
//! when it is not passed in the options, and from [`set_global_api_key`] after that.
//! See the API reference: https://ai.google.dev/gemini-api/docs/quickstart?lang=rest
//!
//! # Configuration File
//! Options can also be read with the `config` crate via [`AssistantOptions::from_config`],
//! from a file (.toml format) with entries like these:
//!
//! <tt>
//!
//! [llm_apis."gemini"]
//!
//! max_gen_tokens = 8192
//!
//! temperature = 0.0
//!
//! model_name = "gemini-1.5-flash"
//!
//! api_url = "https://generativelanguage.googleapis.com/v1beta/models"
//!
//! model_api_timeout = 200
//!
//! </tt>

pub mod assistant;
pub mod error;
pub mod languages;
pub mod llm;
pub mod prompts;
pub mod providers {
    pub mod google;
}

pub use assistant::{clear_global_api_key, set_global_api_key, Assistant, AssistantOptions, SummaryOptions, TranslateResult, DEFAULT_MAX_KEY_POINTS};
pub use error::AssistantError;
pub use languages::{resolve_language_from_locale, Language, SummaryLength, SummaryStyle};
pub use llm::{GenerationConfig, LlmApiResult, TextGenerator};
pub use prompts::{fill_placeholders, prompt_catalog, PromptCatalog, PromptTemplate, Substitution};
