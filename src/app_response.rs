use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::PhraseError;

/// JSON envelope returned by every FFI function.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<PhraseError> for AppResponse {
    fn from(err: PhraseError) -> Self {
        match err {
            PhraseError::LoadFailure(_) | PhraseError::SaveFailure(_) => {
                AppResponse::DatabaseError(err.to_string())
            }
            PhraseError::RemoteFailure(_) => AppResponse::DatabaseError(err.to_string()),
            PhraseError::NotFound(id) => AppResponse::NotFound(format!("No phrase found with id: {id}")),
            PhraseError::Validation(e) => AppResponse::ValidationError(e.to_string()),
            PhraseError::Config(e) => AppResponse::BadRequest(format!("Invalid configuration: {e}")),
            PhraseError::Runtime(msg) => AppResponse::DatabaseError(format!("Runtime error: {msg}")),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// Serializes `value` and wraps it in [`AppResponse::Ok`].
    pub fn from_json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => AppResponse::Ok(json),
            Err(e) => AppResponse::from(e),
        }
    }
}
