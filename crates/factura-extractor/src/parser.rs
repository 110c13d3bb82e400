//! Locate and parse the JSON object in a completion

use crate::error::ParseError;
use serde_json::{Map, Value};

/// Field name to raw JSON value, as answered by the model
pub type FieldMap = Map<String, Value>;

const JSON_FENCE: &str = "```json\n";
const BARE_FENCE: &str = "```\n";

/// Parse a completion into a field map
///
/// Models wrap their answer in markdown fences or prose, so the object is
/// looked for in this order: the whole trimmed text when it starts with `{`,
/// the body of a ```` ```json ```` fence, the body of a bare ```` ``` ````
/// fence, and finally the whole text. Anything but a JSON object fails.
pub fn parse_completion(response: &str) -> Result<FieldMap, ParseError> {
    let normalized = response.replace("\r\n", "\n");
    let candidate = locate_json(&normalized);

    match serde_json::from_str::<Value>(candidate)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError(format!(
            "Expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn locate_json(response: &str) -> &str {
    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    for opener in [JSON_FENCE, BARE_FENCE] {
        if let Some(start) = response.find(opener) {
            return fence_body(&response[start + opener.len()..]);
        }
    }

    response
}

/// Text up to the closing fence line, or to the end when unclosed
fn fence_body(rest: &str) -> &str {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "```" {
            return &rest[..offset];
        }
        offset += line.len();
    }
    rest
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"pdf_sub_total": 100.5, "pdf_currency_code": "MXN"}"#;

    #[test]
    fn test_parse_raw_object() {
        let map = parse_completion(BODY).unwrap();
        assert_eq!(map["pdf_sub_total"], 100.5);
        assert_eq!(map["pdf_currency_code"], "MXN");
    }

    #[test]
    fn test_parse_raw_object_with_surrounding_whitespace() {
        let map = parse_completion(&format!("\n  {}  \n", BODY)).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_json_fence_matches_unfenced() {
        let fenced = format!("Here is the result:\n```json\n{}\n```", BODY);
        assert_eq!(parse_completion(&fenced).unwrap(), parse_completion(BODY).unwrap());
    }

    #[test]
    fn test_bare_fence() {
        let fenced = format!("Sure!\n```\n{}\n```\nLet me know.", BODY);
        assert_eq!(parse_completion(&fenced).unwrap(), parse_completion(BODY).unwrap());
    }

    #[test]
    fn test_unclosed_fence_reads_to_end() {
        let fenced = format!("```json\n{}\n", BODY);
        assert_eq!(parse_completion(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_crlf_fence() {
        let fenced = format!("Result:\r\n```json\r\n{}\r\n```\r\n", BODY);
        assert_eq!(parse_completion(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_prose_without_json_fails() {
        assert!(parse_completion("no valid json here").is_err());
        assert!(parse_completion("").is_err());
    }

    #[test]
    fn test_non_object_fails() {
        let err = parse_completion("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(parse_completion("42").is_err());
        assert!(parse_completion("```json\n\"text\"\n```").is_err());
    }

    #[test]
    fn test_invalid_fenced_body_fails() {
        assert!(parse_completion("```json\n{\"pdf_total\": }\n```").is_err());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let fenced = format!("x\n```json\n{}\n```", BODY);
        assert_eq!(parse_completion(&fenced), parse_completion(&fenced));
    }
}
