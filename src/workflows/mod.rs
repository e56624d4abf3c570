//! Suggestion lifecycle: submission, the admin review queue, promotion and rejection.
//!
//! A suggestion is pending for as long as its row exists. Promotion and rejection
//! both end by deleting that row; there is no way back.

mod claims;
mod promotion;
mod rejection;
mod review_queue;
mod submission;

pub use claims::PromotionClaims;
pub use promotion::{promote_suggestion, PromotionOutcome};
pub use rejection::reject_suggestion;
pub use review_queue::list_review_queue;
pub use submission::{submit_suggestion, SubmissionOutcome};
