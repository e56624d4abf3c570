use crate::error::WorkflowError;
use crate::models::{Suggestion, SubmitSuggestionRequest};
use crate::store::{from_row, to_row, RecordStore, Table};
use crate::validation::{is_spam_signal, validate_submission, SubmissionPolicy};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Accepted(Suggestion),
    /// Honeypot tripped: nothing stored, but the submitter is told it worked.
    Discarded,
}

pub async fn submit_suggestion(
    store: &dyn RecordStore,
    policy: SubmissionPolicy,
    request: &SubmitSuggestionRequest,
) -> Result<SubmissionOutcome, WorkflowError> {
    if is_spam_signal(request) {
        log::warn!("Discarding suggestion with honeypot field set");
        return Ok(SubmissionOutcome::Discarded);
    }

    let suggestion = validate_submission(request, policy)?;

    let row = to_row(&suggestion).map_err(WorkflowError::InsertFailed)?;
    let stored = store
        .insert(Table::Suggestions, row)
        .await
        .and_then(from_row::<Suggestion>)
        .map_err(|err| {
            log::error!("Error inserting suggestion: {err}");
            WorkflowError::InsertFailed(err)
        })?;

    log::info!("Stored suggestion {} ({})", stored.id, stored.name);
    Ok(SubmissionOutcome::Accepted(stored))
}
