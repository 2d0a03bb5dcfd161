use crate::provider::canonical_provider;
use crate::translate::{TranslationRequest, TranslationResponse};
use serde::Serialize;

/// Successful answers from one `compare` call, in the order the providers
/// were given.
#[derive(Clone, Debug, Serialize)]
pub struct ComparisonResult {
    pub request: TranslationRequest,
    pub results: Vec<TranslationResponse>,
}

impl ComparisonResult {
    /// Lowest latency; the earliest listed provider wins a tie.
    pub fn fastest(&self) -> Option<&TranslationResponse> {
        self.results.iter().min_by_key(|r| r.latency_ms)
    }

    pub fn fastest_provider(&self) -> Option<&str> {
        self.fastest().map(|r| r.provider.as_str())
    }

    /// Highest `confidence` metadata. Results without one rank below any
    /// that have one; the earliest listed provider wins a tie.
    pub fn most_confident(&self) -> Option<&TranslationResponse> {
        let mut best: Option<(&TranslationResponse, f64)> = None;
        for result in &self.results {
            let score = result.confidence().unwrap_or(f64::NEG_INFINITY);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((result, score)),
            }
        }
        best.map(|(result, _)| result)
    }

    /// First result from `provider` (aliases accepted).
    pub fn by_provider(&self, provider: &str) -> Option<&TranslationResponse> {
        let id = canonical_provider(provider);
        self.results.iter().find(|r| r.provider == id)
    }
}
