use serde_json::Value;

use crate::domain::error::{AppError, Result};
use crate::domain::test_case::TestCase;
use crate::infrastructure::response::{clean_llm_response, strip_code_fence};

/// Decode a model answer into test cases.
///
/// Accepts a bare JSON array, an array wrapped in a markdown code fence, or an
/// object holding the array under `test_cases`. Anything else is a
/// `ResponseParseError` carrying the untouched model output.
pub(crate) fn decode_test_cases(raw_output: &str) -> Result<Vec<TestCase>> {
    let cleaned = clean_llm_response(raw_output);
    let payload = extract_json_payload(&cleaned);

    let parse_error = |message: String| AppError::ResponseParseError {
        message,
        raw_response: raw_output.to_string(),
    };

    let value: Value = serde_json::from_str(&payload).map_err(|e| parse_error(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object
            .remove("test_cases")
            .or_else(|| object.remove("testCases"))
        {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(parse_error(
                    "expected a JSON array of test cases, got an object".to_string(),
                ))
            }
        },
        other => {
            return Err(parse_error(format!(
                "expected a JSON array of test cases, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(parse_error(format!(
                    "test case #{} is {}, expected an object",
                    index + 1,
                    json_kind(&item)
                )));
            }
            serde_json::from_value::<TestCase>(item)
                .map_err(|e| parse_error(format!("test case #{}: {}", index + 1, e)))
        })
        .collect()
}

pub(crate) fn extract_json_payload(output: &str) -> String {
    let trimmed = output.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        // raw OpenAI-style envelope
        if let Some(content) = value
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            return strip_code_fence(content);
        }
        return trimmed.to_string();
    }

    let stripped = strip_code_fence(trimmed);
    if serde_json::from_str::<Value>(&stripped).is_ok() {
        return stripped;
    }
    // prose around an unfenced array
    match (stripped.find('['), stripped.rfind(']')) {
        (Some(start), Some(end)) if start < end => stripped[start..=end].to_string(),
        _ => stripped,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
