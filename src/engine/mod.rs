pub mod engine;
pub mod llm_client;
pub mod narrator;
pub mod prompt_builder;
pub mod protocol;

#[cfg(test)]
pub mod testing;
