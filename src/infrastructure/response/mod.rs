use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static FENCED_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Strip reasoning blocks some models emit ahead of the answer.
pub fn clean_llm_response(response: &str) -> String {
    let cleaned = THINK_TAG_PATTERN.replace_all(response, "");
    let cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "");
    cleaned.trim_start_matches('\u{feff}').trim().to_string()
}

/// Content of the first markdown code fence, or the trimmed input when there
/// is none. An opening fence without a closing one is dropped.
pub fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = FENCED_BLOCK_PATTERN
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
    {
        return inner.as_str().trim().to_string();
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        return rest.trim().to_string();
    }
    trimmed.to_string()
}
