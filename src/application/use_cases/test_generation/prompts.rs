pub(crate) fn build_system_prompt(language: &str) -> String {
    format!(
        r#"You are an expert software test engineer. Analyze the requirement text you are given.
Consider every boundary value, invalid input and happy path scenario it implies.

Write the test cases in {}. Return ONLY a JSON array, with no explanation before or after it, in this shape:
[
  {{"id": "TC001", "title": "...", "precondition": "...", "steps": "...", "expected_result": "..."}},
  {{"id": "TC002", "title": "...", "precondition": "...", "steps": "...", "expected_result": "..."}}
]
Keep the JSON keys exactly as shown, in English, whatever the output language."#,
        language
    )
}

pub(crate) fn build_user_prompt(requirement_text: &str) -> String {
    format!("Requirement text:\n\"{}\"\n", requirement_text.trim())
}
