use crate::engine::llm_client::{CompletionRequest, LlmBackend, ResponseShape};
use crate::engine::prompt_builder::PromptBuilder;
use crate::error::GenerationError;
use crate::model::llm_decode::{decode_answer, decode_choices, decode_consequence};
use crate::model::memory::MemoryStore;
use crate::model::story::{Choice, Consequence};

/// Typed front for the model: builds a prompt, sends it, decodes the reply,
/// and retries the whole round trip a bounded number of times.
pub struct Narrator<B> {
    backend: B,
    max_attempts: u32,
    max_tokens: Option<u32>,
}

impl<B: LlmBackend> Narrator<B> {
    pub fn new(backend: B, max_attempts: u32, max_tokens: Option<u32>) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            max_tokens,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn initial_options(
        &self,
        context: &str,
        option_type: &str,
    ) -> Result<Vec<Choice>, GenerationError> {
        let prompt = PromptBuilder::initial_options(context, option_type);
        self.generate(prompt, ResponseShape::Choices, decode_choices)
    }

    pub fn choices(&self, store: &MemoryStore) -> Result<Vec<Choice>, GenerationError> {
        self.generate(PromptBuilder::choices(store), ResponseShape::Choices, decode_choices)
    }

    pub fn answer(&self, store: &MemoryStore, question: &str) -> Result<String, GenerationError> {
        self.generate(
            PromptBuilder::question(store, question),
            ResponseShape::Answer,
            decode_answer,
        )
    }

    pub fn consequence(
        &self,
        store: &MemoryStore,
        action: &str,
    ) -> Result<Consequence, GenerationError> {
        self.generate(
            PromptBuilder::consequence(store, action),
            ResponseShape::Consequence,
            decode_consequence,
        )
    }

    fn generate<T>(
        &self,
        prompt: String,
        shape: ResponseShape,
        decode: impl Fn(&str) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let request = CompletionRequest {
            prompt,
            shape,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(shape = shape.name(), prompt = %request.prompt, "requesting generation");

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .backend
                .complete(&request)
                .and_then(|raw| {
                    tracing::debug!(shape = shape.name(), %raw, "raw model output");
                    decode(&raw)
                });

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(shape = shape.name(), attempt, error = %e, "generation failed, retrying");
                }
                Err(e) => {
                    tracing::warn!(shape = shape.name(), attempt, error = %e, "generation failed, giving up");
                    return Err(GenerationError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }
}
