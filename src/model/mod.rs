pub mod game_save;
pub mod llm_decode;
pub mod memory;
pub mod story;
