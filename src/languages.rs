// file: languages.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Languages the assistant can be asked to write in, by two-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Id,
    Da,
    De,
    #[default]
    En,
    Es,
    Fr,
    Hr,
    It,
    Lt,
    Hu,
    Nl,
    No,
    Pl,
    Pt,
    Ro,
    Fi,
    Sv,
    Vi,
    Tr,
    Cs,
    El,
    Bg,
    Ru,
    Uk,
    Hi,
    Th,
    Zh,
    Ja,
    Ko,
}

impl Language {
    pub const ALL: [Language; 29] = [
        Language::Id, Language::Da, Language::De, Language::En, Language::Es, Language::Fr,
        Language::Hr, Language::It, Language::Lt, Language::Hu, Language::Nl, Language::No,
        Language::Pl, Language::Pt, Language::Ro, Language::Fi, Language::Sv, Language::Vi,
        Language::Tr, Language::Cs, Language::El, Language::Bg, Language::Ru, Language::Uk,
        Language::Hi, Language::Th, Language::Zh, Language::Ja, Language::Ko,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Id => "id",
            Language::Da => "da",
            Language::De => "de",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Hr => "hr",
            Language::It => "it",
            Language::Lt => "lt",
            Language::Hu => "hu",
            Language::Nl => "nl",
            Language::No => "no",
            Language::Pl => "pl",
            Language::Pt => "pt",
            Language::Ro => "ro",
            Language::Fi => "fi",
            Language::Sv => "sv",
            Language::Vi => "vi",
            Language::Tr => "tr",
            Language::Cs => "cs",
            Language::El => "el",
            Language::Bg => "bg",
            Language::Ru => "ru",
            Language::Uk => "uk",
            Language::Hi => "hi",
            Language::Th => "th",
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::Ko => "ko",
        }
    }

    /// English name of the language, as written into prompts.
    ///
    /// Exhaustive on purpose: adding a variant without a name does not compile.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Id => "Indonesian",
            Language::Da => "Danish",
            Language::De => "German",
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::Hr => "Croatian",
            Language::It => "Italian",
            Language::Lt => "Lithuanian",
            Language::Hu => "Hungarian",
            Language::Nl => "Dutch",
            Language::No => "Norwegian",
            Language::Pl => "Polish",
            Language::Pt => "Portuguese",
            Language::Ro => "Romanian",
            Language::Fi => "Finnish",
            Language::Sv => "Swedish",
            Language::Vi => "Vietnamese",
            Language::Tr => "Turkish",
            Language::Cs => "Czech",
            Language::El => "Greek",
            Language::Bg => "Bulgarian",
            Language::Ru => "Russian",
            Language::Uk => "Ukrainian",
            Language::Hi => "Hindi",
            Language::Th => "Thai",
            Language::Zh => "Chinese",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| format!("Unsupported language code: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    /// How long the summary should be, phrased for the prompt.
    pub fn phrase(&self) -> &'static str {
        match self {
            SummaryLength::Short => "2-3 sentences",
            SummaryLength::Medium => "1-2 paragraphs",
            SummaryLength::Long => "3-4 paragraphs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Professional,
    Casual,
    Academic,
    Simple,
    Bullet,
}

impl SummaryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Professional => "professional",
            SummaryStyle::Casual => "casual",
            SummaryStyle::Academic => "academic",
            SummaryStyle::Simple => "simple",
            SummaryStyle::Bullet => "bullet-point",
        }
    }
}

/// Lowercased locale identifiers, bare and region-qualified, mapped to their language.
static LOCALE_LANGUAGE_MAP: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    let mut m = HashMap::new();

    for lang in Language::ALL {
        m.insert(lang.code(), lang);
    }

    m.insert("id-id", Language::Id);
    m.insert("da-dk", Language::Da);
    m.insert("de-de", Language::De);
    m.insert("de-at", Language::De);
    m.insert("de-ch", Language::De);
    m.insert("en-us", Language::En);
    m.insert("en-gb", Language::En);
    m.insert("en-au", Language::En);
    m.insert("en-ca", Language::En);
    m.insert("en-in", Language::En);
    m.insert("es-es", Language::Es);
    m.insert("es-419", Language::Es);
    m.insert("es-mx", Language::Es);
    m.insert("fr-fr", Language::Fr);
    m.insert("fr-ca", Language::Fr);
    m.insert("fr-be", Language::Fr);
    m.insert("hr-hr", Language::Hr);
    m.insert("it-it", Language::It);
    m.insert("lt-lt", Language::Lt);
    m.insert("hu-hu", Language::Hu);
    m.insert("nl-nl", Language::Nl);
    m.insert("nl-be", Language::Nl);

    // Norwegian Bokmål and Nynorsk
    m.insert("nb", Language::No);
    m.insert("nn", Language::No);
    m.insert("nb-no", Language::No);
    m.insert("nn-no", Language::No);

    m.insert("pl-pl", Language::Pl);
    m.insert("pt-br", Language::Pt);
    m.insert("pt-pt", Language::Pt);
    m.insert("ro-ro", Language::Ro);
    m.insert("fi-fi", Language::Fi);
    m.insert("sv-se", Language::Sv);
    m.insert("vi-vn", Language::Vi);
    m.insert("tr-tr", Language::Tr);
    m.insert("cs-cz", Language::Cs);
    m.insert("el-gr", Language::El);
    m.insert("bg-bg", Language::Bg);
    m.insert("ru-ru", Language::Ru);
    m.insert("uk-ua", Language::Uk);
    m.insert("hi-in", Language::Hi);
    m.insert("th-th", Language::Th);
    m.insert("zh-cn", Language::Zh);
    m.insert("zh-tw", Language::Zh);
    m.insert("zh-hk", Language::Zh);
    m.insert("zh-hans", Language::Zh);
    m.insert("zh-hant", Language::Zh);
    m.insert("ja-jp", Language::Ja);
    m.insert("ko-kr", Language::Ko);

    m
});

/// Looks up the language for a locale such as `"en-US"` or `"pt_BR"`.
///
/// The whole locale is tried first, lowercased. If that is unknown, the primary
/// language subtag is tried on its own, so `"en-ZZ"` still resolves to English.
/// Empty input and locales that do not parse return `None`.
///
/// # Examples
/// ```
/// use genai_assist::languages::{resolve_language_from_locale, Language};
/// assert_eq!(resolve_language_from_locale("PT-br"), Some(Language::Pt));
/// assert_eq!(resolve_language_from_locale("xx-yy"), None);
/// ```
pub fn resolve_language_from_locale(locale: &str) -> Option<Language> {
    let normalized = locale.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if let Some(lang) = LOCALE_LANGUAGE_MAP.get(normalized.as_str()) {
        return Some(*lang);
    }
    let primary = primary_language_subtag(&normalized)?;
    LOCALE_LANGUAGE_MAP.get(primary.as_str()).copied()
}

/// Extracts the primary language subtag of a BCP 47 style locale.
///
/// Returns `None` when the locale is not well formed: the first subtag must be
/// 2-3 or 5-8 letters, the rest 1-8 alphanumerics.
fn primary_language_subtag(locale: &str) -> Option<String> {
    let mut subtags = locale.split(|c| c == '-' || c == '_');
    let primary = subtags.next()?;
    let primary_ok = matches!(primary.len(), 2..=3 | 5..=8)
        && primary.chars().all(|c| c.is_ascii_alphabetic());
    if !primary_ok {
        return None;
    }
    for subtag in subtags {
        if subtag.is_empty() || subtag.len() > 8 || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
    }
    Some(primary.to_ascii_lowercase())
}
