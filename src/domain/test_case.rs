use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Keys a record must carry to count as structurally valid.
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "title", "precondition", "steps", "expected_result"];

/// One generated or hand-written test scenario.
///
/// Every field is optional: a key that is missing stays `None`, while a key that
/// is present but `null` becomes an empty string. Non-string values are rendered
/// to text so that a model answering `"steps": ["a", "b"]` still yields steps.
/// The localized aliases accept reference files written with the older keys.
/// When a record carries both spellings the English key wins and the alias is
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestCase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precondition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,
    /// Keys outside the fixed schema (priority, tags, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for TestCase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            id: take_field(&mut fields, "id", None),
            title: take_field(&mut fields, "title", Some("baslik")),
            precondition: take_field(&mut fields, "precondition", Some("on_kosul")),
            steps: take_field(&mut fields, "steps", Some("adimlar")),
            expected_result: take_field(&mut fields, "expected_result", Some("beklenen_sonuc")),
            extra: fields,
        })
    }
}

impl TestCase {
    pub fn has_all_required_fields(&self) -> bool {
        self.id.is_some()
            && self.title.is_some()
            && self.precondition.is_some()
            && self.steps.is_some()
            && self.expected_result.is_some()
    }

    pub fn has_precondition(&self) -> bool {
        is_filled(&self.precondition)
    }

    pub fn has_steps(&self) -> bool {
        is_filled(&self.steps)
    }

    pub fn has_expected_result(&self) -> bool {
        is_filled(&self.expected_result)
    }
}

/// Character count of an optional field, missing counts as empty.
pub fn text_len(value: &Option<String>) -> usize {
    value.as_deref().map(|text| text.chars().count()).unwrap_or(0)
}

fn is_filled(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn take_field(fields: &mut Map<String, Value>, key: &str, alias: Option<&str>) -> Option<String> {
    fields
        .remove(key)
        .or_else(|| alias.and_then(|alias| fields.remove(alias)))
        .map(|value| value_to_text(&value))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => value.to_string(),
    }
}
