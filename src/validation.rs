//! Text rules checked before a phrase is added or edited.
//!
//! The reducer never validates; these checks run at the store boundary and
//! their failures never enter [`PhraseState::error`](crate::phrase_state::PhraseState).

use crate::error::ValidationError;
use crate::phrase_model::Phrase;

pub const MIN_TEXT_LEN: usize = 3;
pub const MAX_TEXT_LEN: usize = 200;

/// Checks `text` for a new phrase against the existing collection.
///
/// Returns the trimmed text on success.
pub fn validate_new<'a>(text: &'a str, existing: &[Phrase]) -> Result<&'a str, ValidationError> {
    let trimmed = check_length(text)?;
    if is_duplicate(trimmed, existing, None) {
        return Err(ValidationError::Duplicate);
    }
    Ok(trimmed)
}

/// Checks replacement `text` for the phrase `id`.
///
/// The phrase being edited is excluded from the duplicate check, so saving an
/// unchanged or re-cased text is allowed.
pub fn validate_edit<'a>(
    id: &str,
    text: &'a str,
    existing: &[Phrase],
) -> Result<&'a str, ValidationError> {
    let trimmed = check_length(text)?;
    if is_duplicate(trimmed, existing, Some(id)) {
        return Err(ValidationError::Duplicate);
    }
    Ok(trimmed)
}

fn check_length(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        Err(ValidationError::Empty)
    } else if len < MIN_TEXT_LEN {
        Err(ValidationError::TooShort { min: MIN_TEXT_LEN })
    } else if len > MAX_TEXT_LEN {
        Err(ValidationError::TooLong { max: MAX_TEXT_LEN })
    } else {
        Ok(trimmed)
    }
}

fn is_duplicate(trimmed: &str, existing: &[Phrase], skip_id: Option<&str>) -> bool {
    let needle = trimmed.to_lowercase();
    existing
        .iter()
        .filter(|p| Some(p.id.as_str()) != skip_id)
        .any(|p| p.text.trim().to_lowercase() == needle)
}
