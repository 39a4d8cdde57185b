//! Error types for the phrase core.
//!
//! [`PhraseError`] is what the Rust API returns. The FFI layer converts it into
//! an [`AppResponse`](crate::AppResponse) envelope.

use thiserror::Error;

/// Why a phrase text was rejected before reaching the reducer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("phrase text is required")]
    Empty,

    #[error("phrase must have at least {min} characters")]
    TooShort { min: usize },

    #[error("phrase must have at most {max} characters")]
    TooLong { max: usize },

    #[error("this phrase already exists")]
    Duplicate,
}

/// Invalid [`StoreConfig`](crate::config::StoreConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid failure rate: must be 0.0-1.0, got {0}")]
    InvalidFailureRate(f64),

    #[error("slot name must not be empty")]
    EmptySlotName,

    #[error("database path must not be empty")]
    EmptyPath,

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Errors produced by the store, the storage adapters and the simulation.
#[derive(Debug, Error)]
pub enum PhraseError {
    /// Reading the slot failed (storage unavailable, corrupt payload).
    #[error("storage unavailable: {0}")]
    LoadFailure(String),

    /// Writing the slot failed.
    #[error("storage write failed: {0}")]
    SaveFailure(String),

    /// A simulated remote request failed before storage was touched.
    #[error("simulated {0} request failed")]
    RemoteFailure(String),

    /// Edit/delete of an id that is not in the collection.
    #[error("no phrase found with id: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No Tokio runtime was available to drive the debouncer.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

impl PhraseError {
    /// Storage and remote failures, as opposed to caller mistakes.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            PhraseError::LoadFailure(_) | PhraseError::SaveFailure(_) | PhraseError::RemoteFailure(_)
        )
    }
}
