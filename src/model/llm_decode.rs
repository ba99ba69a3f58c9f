use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GenerationError;
use crate::model::story::{Answer, Choice, Consequence};

/// Decode a list of options. Accepts `{"choices": [...]}` or a bare array.
pub fn decode_choices(json: &str) -> Result<Vec<Choice>, GenerationError> {
    let value = parse(json)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("choices") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(GenerationError::Malformed(
                    "\"choices\" must be a JSON array".to_string(),
                ))
            }
            None => return Err(GenerationError::Empty("choice list")),
        },
        _ => {
            return Err(GenerationError::Malformed(
                "expected a list of choices".to_string(),
            ))
        }
    };

    let choices = items
        .into_iter()
        .map(record::<Choice>)
        .collect::<Result<Vec<_>, _>>()?;

    if choices.is_empty() {
        return Err(GenerationError::Empty("choice list"));
    }
    Ok(choices)
}

pub fn decode_consequence(json: &str) -> Result<Consequence, GenerationError> {
    record(parse(json)?)
}

pub fn decode_answer(json: &str) -> Result<String, GenerationError> {
    let answer: Answer = record(parse(json)?)?;
    if answer.answer.trim().is_empty() {
        return Err(GenerationError::Empty("answer"));
    }
    Ok(answer.answer)
}

fn parse(json: &str) -> Result<Value, GenerationError> {
    let trimmed = strip_code_fence(json.trim());
    if trimmed.is_empty() {
        return Err(GenerationError::Empty("response"));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| GenerationError::Malformed(format!("invalid JSON: {}", e)))
}

/// Only records are accepted; missing fields come back as empty strings.
fn record<T: DeserializeOwned>(value: Value) -> Result<T, GenerationError> {
    if !value.is_object() {
        return Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {}",
            value
        )));
    }
    serde_json::from_value(value).map_err(|e| GenerationError::Malformed(e.to_string()))
}

// Local models like to wrap JSON in ```json fences even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_fill_missing_fields() {
        let json = r#"{"choices": [
            {"emoji": "🔥", "name": "Ember", "choice": "Light the beacon"},
            {"choice": "Wait for dawn", "choice_type": null}
        ]}"#;
        let choices = decode_choices(json).unwrap();
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].choice_type, "");
        assert_eq!(choices[1].emoji, "");
        assert_eq!(choices[1].choice, "Wait for dawn");
    }

    #[test]
    fn bare_array_is_accepted() {
        let choices = decode_choices(r#"[{"choice": "Run"}]"#).unwrap();
        assert_eq!(choices[0].choice, "Run");
    }

    #[test]
    fn empty_choice_list_is_an_error() {
        assert!(matches!(
            decode_choices(r#"{"choices": []}"#),
            Err(GenerationError::Empty(_))
        ));
    }

    #[test]
    fn record_where_list_expected_is_malformed() {
        assert!(matches!(
            decode_choices(r#""just text""#),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            decode_choices(r#"{"choices": [1, 2]}"#),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn consequence_defaults_missing_fields() {
        let c = decode_consequence(r#"{"consequence": "The door creaks open."}"#).unwrap();
        assert_eq!(c.consequence, "The door creaks open.");
        assert_eq!(c.prose, "");
        assert_eq!(c.plot, "");
        assert_eq!(c.choice, "");
    }

    #[test]
    fn list_where_record_expected_is_malformed() {
        assert!(matches!(
            decode_consequence("[]"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let answer = decode_answer("```json\n{\"answer\": \"She left at dusk.\"}\n```").unwrap();
        assert_eq!(answer, "She left at dusk.");
    }

    #[test]
    fn garbage_is_malformed_and_blank_is_empty() {
        assert!(matches!(decode_answer("not json"), Err(GenerationError::Malformed(_))));
        assert!(matches!(decode_answer("   "), Err(GenerationError::Empty(_))));
        assert!(matches!(decode_answer("{}"), Err(GenerationError::Empty(_))));
    }
}
