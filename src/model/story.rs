use serde::{Deserialize, Deserializer, Serialize};

/// One option offered by the model: a character, setting, motivation or
/// next-turn move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choice {
    #[serde(deserialize_with = "string_or_empty")]
    pub emoji: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub choice: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub choice_type: String,
}

impl Choice {
    /// A player-authored option. Only the description is known.
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            choice: text.into(),
            ..Self::default()
        }
    }
}

/// Outcome of a resolved action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consequence {
    #[serde(deserialize_with = "string_or_empty")]
    pub choice: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub consequence: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub plot: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub prose: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Answer {
    #[serde(deserialize_with = "string_or_empty")]
    pub answer: String,
}

/// Entry of the `actions` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub turn_sequence: u64,
    pub choice: String,
    pub consequence: String,
}

/// Entry of the `user_questions` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLogEntry {
    pub question: String,
    pub answer: String,
}

/// Missing fields are handled by `#[serde(default)]`; this covers `null`
/// and stray numbers.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
