use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// ENUMS
// ============================================================================

/// Directory category (fixed set, stored as snake_case text)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Retail,
    #[default]
    Services,
    Health,
    Nonprofit,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Retail,
        Category::Services,
        Category::Health,
        Category::Nonprofit,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Retail => "retail",
            Category::Services => "services",
            Category::Health => "health",
            Category::Nonprofit => "nonprofit",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Retail => "Retail",
            Category::Services => "Services",
            Category::Health => "Health & Wellness",
            Category::Nonprofit => "Nonprofit & Community",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| value.trim().to_string())
    }
}

/// Display-only provenance of a pending suggestion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SuggestionStatus {
    Imported,
    Community,
}

// ============================================================================
// PUBLISHED BUSINESSES
// ============================================================================

/// Published directory entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub verified: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub source_suggestion_id: Option<Uuid>,
}

/// Helper for inserting a business produced by promotion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBusiness {
    pub name: String,
    pub category: Category,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub verified: bool,
    pub featured: bool,
    pub source_suggestion_id: Option<Uuid>,
}

// ============================================================================
// SUGGESTIONS (Moderation Queue)
// ============================================================================

/// Community suggestion awaiting review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Helper used when inserting a validated suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSuggestion {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

/// Suggestion annotated for the admin review queue
#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueueItem {
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub status: SuggestionStatus,
}

// ============================================================================
// SEARCH
// ============================================================================

/// Analytics row written after each executed search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSearchEvent {
    pub location: Option<String>,
    pub category: Option<Category>,
    pub verified_only: bool,
    pub result_count: i64,
}

/// Search intent as received from the presentation layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub verified_only: bool,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<Category>()
            .map(Some)
            .map_err(|unknown| serde::de::Error::custom(format!("unknown category '{unknown}'"))),
    }
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper for read endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Body returned by the promote/reject/submit endpoints on success
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Body returned by the write endpoints on failure
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Public suggestion form payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitSuggestionRequest {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 80))]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub website: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    /// Hidden from humans; anything typed here marks the submission as automated.
    #[serde(default)]
    pub company: Option<String>,
}

/// Admin promotion payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    #[serde(default)]
    pub suggestion_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Anything other than a JSON boolean counts as not provided.
    #[serde(default, deserialize_with = "bool_or_none")]
    pub verified: Option<bool>,
}

fn bool_or_none<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_bool())
}

/// Admin rejection payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[serde(default)]
    pub suggestion_id: Option<String>,
}

/// Filter for the admin review queue
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQueueQuery {
    #[serde(default)]
    pub q: Option<String>,
}
