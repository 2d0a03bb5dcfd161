//! Language resolution.
//!
//! Free-form input ("fr", "French", "français", "frnch") is folded onto one
//! canonical [`Language`], which adapters then map to the code their back end
//! expects via [`resolve_provider_code`].

mod fuzzy;
mod table;

use crate::translate::TranslateError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

use table::LANGUAGES;

const LOG_TARGET: &str = "language";

/// Minimum similarity for silently correcting a typo.
pub const AUTOCORRECT_THRESHOLD: f64 = 0.88;
/// Minimum similarity for a term to be offered as a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.65;
pub const MAX_SUGGESTIONS: usize = 3;

/// Source value meaning "let the provider detect it".
pub const AUTO: &str = "auto";

#[derive(Debug)]
pub struct LanguageEntry {
    pub name: &'static str,
    pub code: &'static str,
    pub aliases: &'static [&'static str],
}

/// A canonical language. Cheap to copy; always points into the static table.
#[derive(Clone, Copy)]
pub struct Language(&'static LanguageEntry);

impl Language {
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        self.0.code
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.0.aliases
    }

    /// Name with an upper-cased first letter, for prompts and display.
    pub fn display_name(&self) -> String {
        let mut chars = self.0.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.0.name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.name)
    }
}

/// Every known language, in table order.
pub fn list_languages() -> Vec<Language> {
    LANGUAGES.iter().map(Language).collect()
}

/// Exact lookup: ISO code, then canonical name, then alias. A regional tag
/// such as `en-US` or `fr_CA` that is not itself an alias falls back to its
/// primary subtag.
pub fn lookup(input: &str) -> Option<Language> {
    let key = input.trim().to_lowercase();
    exact(&key).or_else(|| {
        let (primary, _) = key.split_once(|c: char| c == '-' || c == '_')?;
        exact(primary)
    })
}

fn exact(key: &str) -> Option<Language> {
    if key.is_empty() {
        return None;
    }
    LANGUAGES
        .iter()
        .find(|e| e.code == key)
        .or_else(|| LANGUAGES.iter().find(|e| e.name == key))
        .or_else(|| LANGUAGES.iter().find(|e| e.aliases.contains(&key)))
        .map(Language)
}

/// Resolves free-form input to a canonical language.
///
/// Exact matches win. Otherwise the input is auto-corrected only when a close
/// fuzzy match (at least [`AUTOCORRECT_THRESHOLD`]) is also a single slip away
/// from one of that language's names: one letter dropped, added, or swapped
/// with its neighbour. On failure the error carries up to
/// [`MAX_SUGGESTIONS`] near misses, best first.
pub fn normalize(input: &str) -> Result<Language, TranslateError> {
    if let Some(language) = lookup(input) {
        return Ok(language);
    }

    let key = input.trim().to_lowercase();
    let scored = score_vocabulary(&key);

    let corrected = scored
        .iter()
        .take_while(|(score, _)| *score >= AUTOCORRECT_THRESHOLD)
        .find(|(_, language)| terms(language.0).any(|term| fuzzy::one_slip_apart(&key, term)));
    if let Some((score, language)) = corrected.copied() {
        tracing::debug!(
            target: LOG_TARGET,
            input = %input,
            language = %language,
            score,
            "auto-corrected language"
        );
        return Ok(language);
    }

    let suggestions = scored
        .iter()
        .take_while(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .take(MAX_SUGGESTIONS)
        .map(|(_, language)| language.name().to_owned())
        .collect();

    Err(TranslateError::LanguageNotSupported {
        input: input.to_owned(),
        suggestions,
    })
}

/// Like [`normalize`], but `"auto"` and blank input mean "detect", i.e. `None`.
pub fn normalize_source(input: &str) -> Result<Option<Language>, TranslateError> {
    let key = input.trim();
    if key.is_empty() || key.eq_ignore_ascii_case(AUTO) {
        return Ok(None);
    }
    normalize(key).map(Some)
}

/// Best score per language, highest first. Ties keep table order.
fn score_vocabulary(key: &str) -> Vec<(f64, Language)> {
    let mut scored: Vec<(f64, Language)> = LANGUAGES
        .iter()
        .filter_map(|entry| {
            terms(entry)
                .map(|term| fuzzy::jaro_winkler(key, term))
                .fold(None, |best: Option<f64>, score| match best {
                    Some(b) if b >= score => Some(b),
                    _ => Some(score),
                })
                .map(|score| (score, Language(entry)))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
}

fn terms(entry: &'static LanguageEntry) -> impl Iterator<Item = &'static str> {
    std::iter::once(entry.name).chain(entry.aliases.iter().copied())
}

struct ProviderCodes {
    provider: &'static str,
    uppercase: bool,
    overrides: &'static [(&'static str, &'static str)],
}

// Languages are not split by region, so a regional request ("en-GB",
// "pt-PT") reaches DeepL as the variant listed here.
static PROVIDER_CODES: &[ProviderCodes] = &[
    ProviderCodes {
        provider: "deepl",
        uppercase: true,
        overrides: &[
            ("english", "EN-US"),
            ("portuguese", "PT-BR"),
            ("chinese", "ZH"),
        ],
    },
    ProviderCodes {
        provider: "google",
        uppercase: false,
        overrides: &[("chinese", "zh-CN"), ("hebrew", "iw")],
    },
];

/// The code `provider` expects for `language`. Falls back to the ISO code.
///
/// DeepL requires a regional target for English and Portuguese; those always
/// resolve to `EN-US` and `PT-BR`.
pub fn resolve_provider_code(language: Language, provider: &str) -> String {
    let Some(codes) = PROVIDER_CODES.iter().find(|c| c.provider == provider) else {
        return language.code().to_owned();
    };
    if let Some((_, code)) = codes
        .overrides
        .iter()
        .find(|(name, _)| *name == language.name())
    {
        return (*code).to_owned();
    }
    if codes.uppercase {
        language.code().to_uppercase()
    } else {
        language.code().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn french_spellings_agree() {
        let expected = normalize("french").expect("known");
        for input in ["fr", "français", "FRENCH", "  French  ", "Francais"] {
            assert_eq!(normalize(input).expect(input), expected, "{input}");
        }
        assert_eq!(expected.name(), "french");
        assert_eq!(expected.code(), "fr");
    }

    #[test]
    fn normalize_is_idempotent_over_the_table() {
        for language in list_languages() {
            let inputs = std::iter::once(language.name())
                .chain(std::iter::once(language.code()))
                .chain(language.aliases().iter().copied());
            for input in inputs {
                let once = normalize(input).expect(input);
                assert_eq!(once, language, "{input}");
                assert_eq!(normalize(once.name()).expect(input), once);
            }
        }
    }

    #[test]
    fn single_edit_typo_is_corrected() {
        assert_eq!(normalize("frnch").expect("typo").name(), "french");
        assert_eq!(normalize("spansh").expect("typo").name(), "spanish");
    }

    #[test]
    fn distinct_languages_are_not_auto_corrected() {
        for (input, nearest) in [
            ("latin", "latvian"),
            ("javanese", "japanese"),
            ("malayalam", "malay"),
        ] {
            match normalize(input) {
                Err(TranslateError::LanguageNotSupported { suggestions, .. }) => {
                    assert!(suggestions.iter().any(|s| s == nearest), "{input}: {suggestions:?}");
                }
                other => panic!("{input} should not resolve, got {other:?}"),
            }
        }
    }

    #[test]
    fn adjacent_swap_is_corrected() {
        assert_eq!(normalize("germna").expect("typo").name(), "german");
    }

    #[test]
    fn regional_tags_use_primary_subtag() {
        for (input, expected) in [
            ("en-US", "english"),
            ("en-gb", "english"),
            ("es-ES", "spanish"),
            ("fr_CA", "french"),
            ("zh-TW", "chinese"),
        ] {
            assert_eq!(normalize(input).expect(input).name(), expected, "{input}");
        }
        assert!(lookup("xx-US").is_none());
    }

    #[test]
    fn european_portuguese_collapses_to_deepl_brazilian() {
        let portuguese = normalize("pt-PT").expect("regional tag");
        assert_eq!(portuguese.name(), "portuguese");
        assert_eq!(resolve_provider_code(portuguese, "deepl"), "PT-BR");
        assert_eq!(resolve_provider_code(portuguese, "google"), "pt");
        let english = normalize("en-GB").expect("regional tag");
        assert_eq!(resolve_provider_code(english, "deepl"), "EN-US");
    }

    #[test]
    fn unknown_language_carries_suggestions() {
        match normalize("klingon") {
            Err(TranslateError::LanguageNotSupported { input, suggestions }) => {
                assert_eq!(input, "klingon");
                assert!(!suggestions.is_empty());
                assert!(suggestions.len() <= MAX_SUGGESTIONS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_input_is_not_supported() {
        assert!(matches!(
            normalize("   "),
            Err(TranslateError::LanguageNotSupported { .. })
        ));
    }

    #[test]
    fn auto_source_means_detect() {
        assert_eq!(normalize_source("auto").expect("auto"), None);
        assert_eq!(normalize_source("AUTO").expect("auto"), None);
        assert_eq!(normalize_source("").expect("blank"), None);
        assert_eq!(
            normalize_source("de").expect("german").map(|l| l.name()),
            Some("german")
        );
    }

    #[test]
    fn codes_and_aliases_do_not_collide() {
        let codes: HashSet<_> = list_languages().iter().map(|l| l.code()).collect();
        assert_eq!(codes.len(), list_languages().len());
        for language in list_languages() {
            for alias in language.aliases() {
                assert!(!codes.contains(alias), "alias {alias} shadows a code");
            }
        }
    }

    #[test]
    fn provider_codes_use_overrides_then_iso() {
        let english = normalize("english").expect("known");
        let german = normalize("german").expect("known");
        let chinese = normalize("chinese").expect("known");

        assert_eq!(resolve_provider_code(english, "deepl"), "EN-US");
        assert_eq!(resolve_provider_code(german, "deepl"), "DE");
        assert_eq!(resolve_provider_code(chinese, "google"), "zh-CN");
        assert_eq!(resolve_provider_code(german, "google"), "de");
        assert_eq!(resolve_provider_code(german, "openai"), "de");
    }

    #[test]
    fn provider_codes_are_stable() {
        let portuguese = normalize("pt").expect("known");
        let first = resolve_provider_code(portuguese, "deepl");
        assert_eq!(first, resolve_provider_code(portuguese, "deepl"));
    }

    #[test]
    fn serializes_as_canonical_name() {
        let japanese = normalize("日本語").expect("known");
        assert_eq!(
            serde_json::to_string(&japanese).expect("serialize"),
            "\"japanese\""
        );
        assert_eq!(japanese.display_name(), "Japanese");
    }
}
