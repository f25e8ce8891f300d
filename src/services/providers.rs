//! Provider auto-detection and per-provider defaults.

use crate::domain::Provider;

/// Keys longer than this are assumed to be Google credentials.
const LONG_KEY_THRESHOLD: usize = 100;

/// Predicate over the raw key and its trimmed lower-case form.
type Predicate = fn(raw: &str, lowered: &str) -> bool;

/// Evaluated in order; the first matching predicate wins.
static DETECTION_RULES: [(Predicate, Provider); 3] = [
    (|_, k| k.starts_with("sk-ant-"), Provider::Anthropic),
    (|_, k| k.starts_with("sk-"), Provider::OpenAi),
    (
        |raw, k| k.starts_with("aiza") || raw.len() > LONG_KEY_THRESHOLD,
        Provider::Google,
    ),
];

/// Guesses the vendor from the shape of an API key.
#[must_use]
pub fn detect(api_key: &str) -> Option<Provider> {
    if api_key.is_empty() {
        return None;
    }

    let lowered = api_key.trim().to_lowercase();
    DETECTION_RULES
        .iter()
        .find(|(predicate, _)| predicate(api_key, &lowered))
        .map(|(_, provider)| provider.clone())
}

#[must_use]
pub fn default_model(provider: &Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "claude-3-opus",
        Provider::Google => "gemini-2.5-flash",
        Provider::OpenAi | Provider::Other(_) => "gpt-4",
    }
}

#[must_use]
pub fn default_base_url(provider: &Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some("https://api.openai.com/v1"),
        Provider::Anthropic => Some("https://api.anthropic.com/v1"),
        Provider::Google => Some("https://generativelanguage.googleapis.com/v1"),
        Provider::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_prefix_beats_openai_prefix() {
        assert_eq!(detect("sk-ant-api03-xyz"), Some(Provider::Anthropic));
        assert_eq!(detect("SK-ANT-upper"), Some(Provider::Anthropic));
        assert_eq!(detect("sk-proj-abc"), Some(Provider::OpenAi));
    }

    #[test]
    fn google_keys_by_prefix_or_length() {
        assert_eq!(detect("AIzaSyA1234"), Some(Provider::Google));
        assert_eq!(detect(&"x".repeat(101)), Some(Provider::Google));
        assert_eq!(detect(&"x".repeat(100)), None);
    }

    #[test]
    fn unknown_or_empty_keys_are_not_detected() {
        assert_eq!(detect(""), None);
        assert_eq!(detect("abc123"), None);
    }

    #[test]
    fn defaults_per_provider() {
        assert_eq!(default_model(&Provider::OpenAi), "gpt-4");
        assert_eq!(default_model(&Provider::Anthropic), "claude-3-opus");
        assert_eq!(default_model(&Provider::Google), "gemini-2.5-flash");
        assert_eq!(default_model(&Provider::Other("mistral".into())), "gpt-4");

        assert_eq!(
            default_base_url(&Provider::Google),
            Some("https://generativelanguage.googleapis.com/v1")
        );
        assert_eq!(default_base_url(&Provider::Other("mistral".into())), None);
    }
}
