//! Data model definitions for stored phrases.
//!
//! This module defines [`Phrase`], the only record the core persists, together
//! with the two external sources a new phrase needs: a [`Clock`] for the
//! creation timestamp and a random suffix for its id.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet used for the random part of a phrase id.
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of a phrase id.
const ID_SUFFIX_LEN: usize = 9;

/// A single user-entered text record.
///
/// A phrase is immutable once created, except for `text`, which an edit
/// replaces. The collection the store keeps is ordered newest first.
///
/// # Serialization
///
/// Field names follow the persisted layout (`id`, `text`, `createdAt`), so a
/// stored slot is a plain JSON array of these objects:
///
/// ```rust
/// use phrase_core::phrase_model::Phrase;
///
/// let phrase = Phrase {
///     id: "1718000000000-k3j9x0q2a".to_string(),
///     text: "Hola mundo".to_string(),
///     created_at: 1_718_000_000_000,
/// };
///
/// let json = serde_json::to_string(&phrase)?;
/// assert!(json.contains("\"createdAt\":1718000000000"));
///
/// let back: Phrase = serde_json::from_str(&json)?;
/// assert_eq!(back, phrase);
/// # Ok::<(), serde_json::Error>(())
/// ```
///
/// # Field Constraints
///
/// - **id**: unique within the collection, opaque to every consumer
/// - **text**: trimmed, 3 to 200 characters, checked by
///   [`validation`](crate::validation) before the phrase is built
/// - **created_at**: milliseconds since the Unix epoch
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Phrase {
    /// Unique, opaque identifier.
    pub id: String,

    /// The phrase itself, already trimmed.
    pub text: String,

    /// Creation time in milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Phrase {
    /// Builds a new phrase from raw input, trimming the text and stamping it
    /// with `now_ms`.
    ///
    /// The text is not validated here; callers run
    /// [`validate_new`](crate::validation::validate_new) first.
    pub fn create<R: Rng>(text: &str, now_ms: i64, rng: &mut R) -> Self {
        Self {
            id: generate_phrase_id(now_ms, rng),
            text: text.trim().to_string(),
            created_at: now_ms,
        }
    }
}

/// Builds an id of the form `<now-ms>-<9 base-36 chars>`.
///
/// Collisions need two phrases in the same millisecond with the same 9-char
/// suffix, which is negligible at human entry rates.
pub fn generate_phrase_id<R: Rng>(now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{now_ms}-{suffix}")
}

/// Time source for phrase timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
