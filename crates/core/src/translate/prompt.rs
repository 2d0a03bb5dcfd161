use crate::language::Language;

/// Low randomness keeps generative output close to repeatable.
pub const GENERATIVE_TEMPERATURE: f32 = 0.3;
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Instruction sent ahead of the user's text to chat-style back ends.
pub fn system_prompt(target: Language, source: Option<Language>) -> String {
    let from = match source {
        Some(source) => format!(" from {}", source.display_name()),
        None => String::new(),
    };
    format!(
        "You are a professional translator. Translate the user's message{from} into {}. \
         Reply with the translation only, without explanations or notes. \
         Keep the original formatting and line breaks.",
        target.display_name()
    )
}

/// Trims the reply and drops one pair of quotes wrapping the whole text.
pub(crate) fn clean_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('«', '»')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim().to_owned();
            }
        }
    }
    trimmed.to_owned()
}
