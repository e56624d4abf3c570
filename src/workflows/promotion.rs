use serde_json::Value;

use super::claims::PromotionClaims;
use crate::error::WorkflowError;
use crate::models::PromoteRequest;
use crate::store::{to_row, Filter, RecordStore, Table};
use crate::validation::validate_promotion;

/// Result of a promotion that published its business.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome {
    pub business_id: Option<String>,
    /// False when the cleanup delete failed and the suggestion is left orphaned.
    pub suggestion_cleared: bool,
}

/// Publishes a suggestion as a business, then removes the suggestion.
///
/// The business insert always happens before the suggestion delete. A failed insert
/// leaves the suggestion pending; a failed delete after a successful insert is
/// logged and the promotion still counts as done.
pub async fn promote_suggestion(
    store: &dyn RecordStore,
    claims: &PromotionClaims,
    request: &PromoteRequest,
) -> Result<PromotionOutcome, WorkflowError> {
    let promotion = validate_promotion(request)?;
    let suggestion_id = promotion.suggestion_id.as_str();

    let _claim = claims
        .try_claim(suggestion_id)
        .ok_or(WorkflowError::PromotionInProgress)?;

    let pending = store
        .query(Table::Suggestions, &[Filter::eq("id", suggestion_id)], &[])
        .await
        .map_err(|err| {
            log::error!("Failed to load suggestion {suggestion_id}: {err}");
            WorkflowError::StoreReadFailed(err)
        })?;
    if pending.is_empty() {
        return Err(WorkflowError::SuggestionNotFound);
    }

    let row = to_row(&promotion.business).map_err(WorkflowError::InsertFailed)?;
    let stored = store
        .insert(Table::Businesses, row)
        .await
        .map_err(|err| {
            log::error!("Error inserting business for suggestion {suggestion_id}: {err}");
            WorkflowError::InsertFailed(err)
        })?;

    let business_id = stored.get("id").and_then(Value::as_str).map(str::to_string);

    let suggestion_cleared = match store
        .delete(Table::Suggestions, &[Filter::eq("id", suggestion_id)])
        .await
    {
        Ok(_) => true,
        Err(err) => {
            log::warn!(
                "Business {} published but suggestion {suggestion_id} could not be removed: {err}",
                business_id.as_deref().unwrap_or("<unknown>")
            );
            false
        }
    };

    log::info!(
        "Promoted suggestion {suggestion_id} to business {}",
        business_id.as_deref().unwrap_or("<unknown>")
    );

    Ok(PromotionOutcome {
        business_id,
        suggestion_cleared,
    })
}
