//! Translate text through several back ends behind one contract, and compare
//! their answers side by side.

pub mod config;
pub mod language;
pub mod orchestrator;
pub mod provider;
pub mod translate;

mod global;

pub use global::{
    compare, compare_async, configure, default_config, default_orchestrator,
    list_configured_providers, list_languages, list_providers, normalize_language, reset,
    set_default_config, translate, translate_async,
};
pub use language::Language;
pub use orchestrator::{ComparisonResult, Orchestrator};
pub use translate::{TranslateError, TranslationRequest, TranslationResponse, Translator};
