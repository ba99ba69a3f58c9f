//! Error types for the store, the save file, the model client and the game loop.

use std::path::PathBuf;

use thiserror::Error;

/// A save file could not be turned back into a store.
#[derive(Debug, Error)]
pub enum StoreLoadError {
    #[error("could not read save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("save file {path} is inconsistent: version {version} but {history} history records")]
    Inconsistent {
        path: PathBuf,
        version: u64,
        history: usize,
    },

    #[error("save file {path} has history record {position} stamped as version {version}")]
    OutOfSequence {
        path: PathBuf,
        position: usize,
        version: u64,
    },

    #[error("save file {path} has entry {key:?} with no history record")]
    Untracked { path: PathBuf, key: String },
}

/// Writing the store to disk failed. Always fatal.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not write save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode story memory: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The text-generation service failed to produce a usable response.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to the model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned malformed output: {0}")]
    Malformed(String),

    #[error("model returned an empty {0}")]
    Empty(&'static str),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

/// Player input that doesn't map to anything on offer. Recoverable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInputError {
    #[error("there is no option {pick}; pick 1-{offered} or 4")]
    ChoiceOutOfRange { pick: usize, offered: usize },

    #[error("please type something first")]
    EmptyText,
}

/// Anything that ends the game loop early.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Load(#[from] StoreLoadError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("console I/O failed: {0}")]
    Console(#[from] std::io::Error),

    #[error("could not encode story record: {0}")]
    Encode(#[from] serde_json::Error),
}
