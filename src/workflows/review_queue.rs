use crate::classifier::StatusClassifier;
use crate::error::WorkflowError;
use crate::models::{ReviewQueueItem, Suggestion};
use crate::store::{from_rows, Order, RecordStore, Table};

/// Pending suggestions, newest first, optionally narrowed by free text.
pub async fn list_review_queue(
    store: &dyn RecordStore,
    classifier: &StatusClassifier,
    filter: Option<&str>,
) -> Result<Vec<ReviewQueueItem>, WorkflowError> {
    let suggestions: Vec<Suggestion> = store
        .query(Table::Suggestions, &[], &[Order::desc("created_at")])
        .await
        .and_then(from_rows)
        .map_err(|err| {
            log::error!("Failed to list suggestions: {err}");
            WorkflowError::StoreReadFailed(err)
        })?;

    let needle = filter
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    Ok(suggestions
        .into_iter()
        .filter(|suggestion| needle.as_deref().map_or(true, |needle| mentions(suggestion, needle)))
        .map(|suggestion| ReviewQueueItem {
            status: classifier.classify(&suggestion),
            suggestion,
        })
        .collect())
}

fn mentions(suggestion: &Suggestion, needle: &str) -> bool {
    [
        Some(suggestion.name.as_str()),
        suggestion.city.as_deref(),
        suggestion.state.as_deref(),
        suggestion.notes.as_deref(),
        suggestion.website.as_deref(),
    ]
    .into_iter()
    .map(Option::unwrap_or_default)
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
    .contains(needle)
}
