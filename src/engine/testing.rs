//! Scripted doubles for the model and the console.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use crate::engine::llm_client::{CompletionRequest, LlmBackend};
use crate::error::GenerationError;
use crate::ui::console::Console;

/// Replies from a fixed script and records every request.
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<Result<String, GenerationError>>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn replying(replies: impl IntoIterator<Item = String>) -> Self {
        Self::new(replies.into_iter().map(Ok))
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }
}

impl LlmBackend for ScriptedBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty("script")))
    }
}

/// Feeds fixed lines and captures everything printed. Running out of lines
/// reads as end of input.
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    output: String,
}

impl ScriptedConsole {
    pub fn new<S: Into<String>>(inputs: impl IntoIterator<Item = S>) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
}

/// `{"choices": [...]}` with one entry per description.
pub fn choices_json(choices: &[&str]) -> String {
    let items: Vec<_> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            serde_json::json!({
                "emoji": "✨",
                "name": format!("Option {}", i + 1),
                "choice": choice,
                "choice_type": "twist",
            })
        })
        .collect();
    serde_json::json!({ "choices": items }).to_string()
}

pub fn consequence_json(choice: &str, consequence: &str, prose: &str, plot: &str) -> String {
    serde_json::json!({
        "choice": choice,
        "consequence": consequence,
        "prose": prose,
        "plot": plot,
    })
    .to_string()
}

pub fn answer_json(answer: &str) -> String {
    serde_json::json!({ "answer": answer }).to_string()
}
