//! Phrase collection state and the reducer that evolves it.
//!
//! [`reduce`] is the only way state changes. It is pure: it never touches its
//! input and hands back a new [`Arc`], or the very same `Arc` when the action
//! is [`Action::Unknown`], so callers can detect a no-op with [`Arc::ptr_eq`].

use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::phrase_model::Phrase;

/// Everything the presentation layer renders from.
///
/// `error.is_some()` implies `!is_loading`: every transition that sets an
/// error also clears the loading flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseState {
    /// Newest first.
    pub phrases: Vec<Phrase>,
    /// Raw, undebounced query as typed.
    pub search_query: String,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl PhraseState {
    /// Startup state: empty collection, waiting for the first load.
    pub fn initial() -> Self {
        Self {
            phrases: Vec::new(),
            search_query: String::new(),
            is_loading: true,
            error: None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.phrases.iter().any(|p| p.id == id)
    }
}

impl Default for PhraseState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A requested state transition.
///
/// The JSON form is `{"type": "ADD_PHRASE", "payload": {...}}`; any type the
/// enum does not know decodes to [`Action::Unknown`], whatever its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddPhrase(Phrase),
    DeletePhrase(String),
    EditPhrase { id: String, text: String },
    SetSearchQuery(String),
    SetLoading(bool),
    /// `None` clears the error.
    SetError(Option<String>),
    LoadPhrases(Vec<Phrase>),
    Unknown,
}

/// Wire shape of an action before its type is resolved.
#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct EditPayload {
    id: String,
    text: String,
}

impl Action {
    /// Whether this action can change the phrase collection.
    pub fn touches_phrases(&self) -> bool {
        matches!(
            self,
            Action::AddPhrase(_)
                | Action::DeletePhrase(_)
                | Action::EditPhrase { .. }
                | Action::LoadPhrases(_)
        )
    }

    fn decode(kind: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let action = match kind {
            "ADD_PHRASE" => Action::AddPhrase(serde_json::from_value(payload)?),
            "DELETE_PHRASE" => Action::DeletePhrase(serde_json::from_value(payload)?),
            "EDIT_PHRASE" => {
                let EditPayload { id, text } = serde_json::from_value(payload)?;
                Action::EditPhrase { id, text }
            }
            "SET_SEARCH_QUERY" => Action::SetSearchQuery(serde_json::from_value(payload)?),
            "SET_LOADING" => Action::SetLoading(serde_json::from_value(payload)?),
            "SET_ERROR" => Action::SetError(serde_json::from_value(payload)?),
            "LOAD_PHRASES" => Action::LoadPhrases(serde_json::from_value(payload)?),
            _ => Action::Unknown,
        };
        Ok(action)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawAction { kind, payload } = RawAction::deserialize(deserializer)?;
        Action::decode(&kind, payload)
            .map_err(|e| de::Error::custom(format!("invalid payload for {kind}: {e}")))
    }
}

/// Applies `action` to `state`.
///
/// Absent ids on delete/edit are silent no-ops on the collection (the error
/// is still cleared). Nothing here validates text or checks for duplicates.
pub fn reduce(state: &Arc<PhraseState>, action: Action) -> Arc<PhraseState> {
    let next = match action {
        Action::AddPhrase(phrase) => {
            let mut phrases = Vec::with_capacity(state.phrases.len() + 1);
            phrases.push(phrase);
            phrases.extend(state.phrases.iter().cloned());
            PhraseState {
                phrases,
                error: None,
                ..PhraseState::clone(state)
            }
        }

        Action::DeletePhrase(id) => PhraseState {
            phrases: state.phrases.iter().filter(|p| p.id != id).cloned().collect(),
            error: None,
            ..PhraseState::clone(state)
        },

        Action::EditPhrase { id, text } => PhraseState {
            phrases: state
                .phrases
                .iter()
                .map(|p| {
                    if p.id == id {
                        Phrase {
                            text: text.clone(),
                            ..p.clone()
                        }
                    } else {
                        p.clone()
                    }
                })
                .collect(),
            error: None,
            ..PhraseState::clone(state)
        },

        Action::SetSearchQuery(query) => PhraseState {
            search_query: query,
            ..PhraseState::clone(state)
        },

        Action::SetLoading(is_loading) => PhraseState {
            is_loading,
            ..PhraseState::clone(state)
        },

        Action::SetError(error) => PhraseState {
            error,
            is_loading: false,
            ..PhraseState::clone(state)
        },

        Action::LoadPhrases(phrases) => PhraseState {
            phrases,
            is_loading: false,
            ..PhraseState::clone(state)
        },

        Action::Unknown => return Arc::clone(state),
    };

    Arc::new(next)
}
