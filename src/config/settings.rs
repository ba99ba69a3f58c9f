use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime configuration for the model endpoint and save location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OpenAI-compatible chat completions URL.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,

    /// Requests per generation before giving up on it.
    pub max_attempts: u32,

    /// Environment variable holding the bearer token, if the endpoint needs one.
    pub api_key_env: String,

    /// Where `story_<n>.gsg` files are looked up and created.
    pub save_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "local-model".to_string(),
            temperature: 0.7,
            max_tokens: None,
            max_attempts: 3,
            api_key_env: "OPENAI_API_KEY".to_string(),
            save_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"model": "gpt-4o-2024-08-06", "max_attempts": 5}"#).unwrap();
        assert_eq!(settings.model, "gpt-4o-2024-08-06");
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.endpoint, Settings::default().endpoint);
        assert_eq!(settings.save_dir, PathBuf::from("."));
    }
}
