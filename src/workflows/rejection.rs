use crate::error::WorkflowError;
use crate::models::RejectRequest;
use crate::store::{Filter, RecordStore, Table};
use crate::validation::validate_rejection;

/// Discards a suggestion. Rejecting an id that is already gone succeeds.
pub async fn reject_suggestion(
    store: &dyn RecordStore,
    request: &RejectRequest,
) -> Result<u64, WorkflowError> {
    let suggestion_id = validate_rejection(request.suggestion_id.as_deref())?;

    let removed = store
        .delete(Table::Suggestions, &[Filter::eq("id", suggestion_id.as_str())])
        .await
        .map_err(|err| {
            log::error!("Error deleting suggestion {suggestion_id}: {err}");
            WorkflowError::DeleteFailed(err)
        })?;

    log::info!("Rejected suggestion {suggestion_id} ({removed} row(s) removed)");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;

    fn request(id: &str) -> RejectRequest {
        RejectRequest {
            suggestion_id: Some(id.to_string()),
        }
    }

    #[actix_rt::test]
    async fn rejecting_twice_is_idempotent() {
        let store = FlakyStore::new();
        let id = store.seed_suggestion("Soul Kitchen", None).await;

        assert_eq!(reject_suggestion(&store, &request(&id)).await.unwrap(), 1);
        assert_eq!(reject_suggestion(&store, &request(&id)).await.unwrap(), 0);

        assert!(store.rows(Table::Suggestions).await.is_empty());
        assert!(store.rows(Table::Businesses).await.is_empty());
    }

    #[actix_rt::test]
    async fn missing_id_is_a_validation_error() {
        let store = FlakyStore::new();
        let err = reject_suggestion(&store, &RejectRequest::default())
            .await
            .expect_err("id required");
        assert_eq!(err.to_string(), "suggestionId is required.");
        assert_eq!(store.writes(), 0);
    }

    #[actix_rt::test]
    async fn store_failure_is_surfaced() {
        let store = FlakyStore::new();
        store.fail_deletes_on(Table::Suggestions);
        let id = store.seed_suggestion("Soul Kitchen", None).await;

        let err = reject_suggestion(&store, &request(&id))
            .await
            .expect_err("delete fails");
        assert!(matches!(err, WorkflowError::DeleteFailed(_)));
        assert_eq!(store.rows(Table::Suggestions).await.len(), 1);
    }
}
