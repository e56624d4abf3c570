//! Gatekeeping for submission and promotion payloads.
//!
//! Everything here is pure: payloads are checked and normalized before any store call.

use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::ValidationError;
use crate::models::{Category, NewBusiness, NewSuggestion, PromoteRequest, SubmitSuggestionRequest};

pub const DEFAULT_STATE: &str = "FL";

/// Controls which submission fields are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    pub require_city: bool,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self { require_city: true }
    }
}

/// Promotion payload after validation, still tied to its suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPromotion {
    pub suggestion_id: String,
    pub business: NewBusiness,
}

/// Trims a field, mapping "not provided" and blank input to `None`.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Uppercases and keeps the first two characters. Anything that does not come out as
/// two ASCII letters is treated as not provided.
pub fn normalize_state(value: Option<&str>) -> Option<String> {
    let state: String = clean(value)?.to_uppercase().chars().take(2).collect();
    let is_code = state.len() == 2 && state.chars().all(|c| c.is_ascii_uppercase());
    is_code.then_some(state)
}

/// True when the hidden honeypot field carries anything at all.
pub fn is_spam_signal(input: &SubmitSuggestionRequest) -> bool {
    clean(input.company.as_deref()).is_some()
}

pub fn validate_submission(
    input: &SubmitSuggestionRequest,
    policy: SubmissionPolicy,
) -> Result<NewSuggestion, ValidationError> {
    let name = clean(input.name.as_deref());
    let city = clean(input.city.as_deref());

    match (&name, &city) {
        (None, _) | (_, None) if policy.require_city => {
            return Err(ValidationError::missing("Business name and city are required."));
        }
        (None, _) => return Err(ValidationError::missing("Business name is required.")),
        _ => {}
    }

    input.validate().map_err(first_length_error)?;

    let state =
        normalize_state(input.state.as_deref()).unwrap_or_else(|| DEFAULT_STATE.to_string());

    Ok(NewSuggestion {
        name: name.unwrap_or_default(),
        city,
        state: Some(state),
        website: clean(input.website.as_deref()),
        notes: clean(input.notes.as_deref()),
    })
}

pub fn validate_promotion(input: &PromoteRequest) -> Result<ValidatedPromotion, ValidationError> {
    let (Some(suggestion_id), Some(name)) = (
        clean(input.suggestion_id.as_deref()),
        clean(input.name.as_deref()),
    ) else {
        return Err(ValidationError::missing("suggestionId and name are required."));
    };

    let category = match clean(input.category.as_deref()) {
        Some(raw) => raw
            .parse::<Category>()
            .map_err(ValidationError::UnknownCategory)?,
        None => Category::default(),
    };

    Ok(ValidatedPromotion {
        business: NewBusiness {
            name,
            category,
            address: clean(input.address.as_deref()),
            city: clean(input.city.as_deref()),
            state: normalize_state(input.state.as_deref()),
            zip: clean(input.zip.as_deref()),
            description: clean(input.description.as_deref()),
            phone: clean(input.phone.as_deref()),
            website: clean(input.website.as_deref()),
            verified: input.verified.unwrap_or(true),
            featured: false,
            source_suggestion_id: Uuid::parse_str(&suggestion_id).ok(),
        },
        suggestion_id,
    })
}

pub fn validate_rejection(suggestion_id: Option<&str>) -> Result<String, ValidationError> {
    clean(suggestion_id).ok_or(ValidationError::missing("suggestionId is required."))
}

fn first_length_error(errors: ValidationErrors) -> ValidationError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|left, right| left.0.cmp(&right.0));

    fields
        .into_iter()
        .find_map(|(field, errors)| {
            errors.iter().find_map(|error| {
                error
                    .params
                    .get("max")
                    .and_then(|max| max.as_u64())
                    .map(|max| ValidationError::TooLong {
                        field: field.to_string(),
                        max,
                    })
            })
        })
        .unwrap_or(ValidationError::missing("Submission is invalid."))
}
