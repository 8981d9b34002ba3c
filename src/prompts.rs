// file: prompts.rs

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use log::{debug, info};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use crate::error::{AssistantError, Result};

/// Location of the bundled prompt catalog, relative to the crate directory.
pub const PROMPT_CATALOG_FILE: &str = "data/prompts.json";
/// Environment variable naming a prompt catalog file to use instead of the bundled one.
pub const PROMPT_CATALOG_ENV_VAR: &str = "GENAI_ASSIST_PROMPTS";

pub const SUMMARIZE_PROMPT: &str = "summarize";
pub const KEYPOINTS_PROMPT: &str = "keypoints";
pub const TRANSLATE_PROMPT: &str = "translate";

static PROMPT_CATALOG: OnceCell<PromptCatalog> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub description: String,
    pub template: String,
}

/// Prompt templates keyed by prompt name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptCatalog {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptCatalog {

    pub fn from_json(json: &str) -> Result<PromptCatalog> {
        serde_json::from_str(json).map_err(AssistantError::PromptCatalogFormat)
    }

    /// Reads a catalog from a JSON file shaped as `{ "<name>": { "description", "template" } }`.
    pub fn load(path: &Path) -> Result<PromptCatalog> {
        let json = std::fs::read_to_string(path).map_err(|source| AssistantError::PromptCatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = PromptCatalog::from_json(&json)?;
        info!("Loaded {} prompt templates from {}", catalog.templates.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Path of the process-wide catalog: [`PROMPT_CATALOG_ENV_VAR`] when set, else the bundled file.
pub fn default_catalog_path() -> PathBuf {
    catalog_path_from(std::env::var_os(PROMPT_CATALOG_ENV_VAR))
}

fn catalog_path_from(override_path: Option<OsString>) -> PathBuf {
    match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join(PROMPT_CATALOG_FILE),
    }
}

/// The process-wide prompt catalog, read from [`default_catalog_path`] on first use.
///
/// Once loaded it is never modified. A failed load is returned to the caller and
/// attempted again on the next call.
pub fn prompt_catalog() -> Result<&'static PromptCatalog> {
    PROMPT_CATALOG.get_or_try_init(|| {
        let path = default_catalog_path();
        debug!("Loading prompt catalog from {}", path.display());
        PromptCatalog::load(&path)
    })
}

/// A single placeholder replacement applied by [`fill_placeholders`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution<'a> {
    /// Replace only the first occurrence of the placeholder.
    First(&'a str, &'a str),
    /// Replace every occurrence of the placeholder.
    All(&'a str, &'a str),
}

/// Renders a template by applying the substitutions in order.
///
/// Each substitution sees the output of the previous one. A placeholder that is
/// not present in the template is left alone.
///
/// # Examples
/// ```
/// use genai_assist::prompts::{fill_placeholders, Substitution};
/// let rendered = fill_placeholders(
///     "{a} {a} {b} {b}",
///     &[Substitution::First("{a}", "x"), Substitution::All("{b}", "y")],
/// );
/// assert_eq!(rendered, "x {a} y y");
/// ```
pub fn fill_placeholders(template: &str, substitutions: &[Substitution]) -> String {
    let mut rendered = template.to_string();
    for substitution in substitutions {
        rendered = match *substitution {
            Substitution::First(placeholder, value) => rendered.replacen(placeholder, value, 1),
            Substitution::All(placeholder, value) => rendered.replace(placeholder, value),
        };
    }
    rendered
}
