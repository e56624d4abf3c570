use std::sync::Arc;

use actix_web::{error::InternalError, get, post, web, HttpResponse, Responder};
use serde::Serialize;

use crate::classifier::StatusClassifier;
use crate::error::{WorkflowError, INVALID_JSON, STORE_UNCONFIGURED};
use crate::models::{
    ActionResponse, ApiResponse, Category, ErrorBody, PromoteRequest, RejectRequest,
    ReviewQueueQuery, SearchQuery, SubmitSuggestionRequest,
};
use crate::search;
use crate::store::RecordStore;
use crate::validation::SubmissionPolicy;
use crate::workflows::{self, PromotionClaims, SubmissionOutcome};

const SUBMITTED_MESSAGE: &str = "Thank you! Your suggestion was submitted.";
const SUBMIT_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";
const SEARCH_FAILED_MESSAGE: &str = "Something went wrong while searching. Please try again.";

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub store: Option<Arc<dyn RecordStore>>,
    pub claims: PromotionClaims,
    pub classifier: StatusClassifier,
    pub submission: SubmissionPolicy,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn RecordStore>>, submission: SubmissionPolicy) -> Self {
        Self {
            store,
            claims: PromotionClaims::new(),
            classifier: StatusClassifier::default(),
            submission,
        }
    }

    fn store(&self) -> Result<&Arc<dyn RecordStore>, WorkflowError> {
        self.store.as_ref().ok_or(WorkflowError::StoreUnconfigured)
    }
}

/// Registers every route under `/api`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejecting request body: {err}");
        InternalError::from_response(err, HttpResponse::BadRequest().json(ErrorBody::new(INVALID_JSON)))
            .into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let response =
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!("Invalid query: {err}")));
        InternalError::from_response(err, response).into()
    });

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(query_config)
            // Health
            .service(health_check)
            .service(list_categories)
            // Public directory
            .service(featured_businesses)
            .service(search_businesses)
            .service(submit_suggestion)
            // Admin moderation
            .service(list_suggestions)
            .service(promote_suggestion)
            .service(reject_suggestion),
    );
}

/// Maps admin workflow failures onto the `{ error }` contract.
fn admin_error_response(err: &WorkflowError) -> HttpResponse {
    let body = ErrorBody::new(err.to_string());
    match err {
        WorkflowError::Validation(_) => HttpResponse::BadRequest().json(body),
        WorkflowError::PromotionInProgress => HttpResponse::Conflict().json(body),
        WorkflowError::SuggestionNotFound => HttpResponse::NotFound().json(body),
        WorkflowError::InsertFailed(store_err) if store_err.is_conflict() => {
            HttpResponse::Conflict().json(body)
        }
        WorkflowError::StoreReadFailed(_) => {
            HttpResponse::InternalServerError().json(ErrorBody::new(SUBMIT_FAILED_MESSAGE))
        }
        WorkflowError::InsertFailed(_)
        | WorkflowError::DeleteFailed(_)
        | WorkflowError::StoreUnconfigured => HttpResponse::InternalServerError().json(body),
    }
}

/// Read paths never leak store details; partial results are never returned.
fn read_error_response(err: &WorkflowError) -> HttpResponse {
    if matches!(err, WorkflowError::StoreUnconfigured) {
        log::error!("{STORE_UNCONFIGURED}");
    }
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error(SEARCH_FAILED_MESSAGE.to_string()))
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "business-directory-service",
        "record_store": state.store.is_some(),
        "timestamp": chrono::Utc::now()
    }))
}

#[derive(Serialize)]
struct CategoryOption {
    value: Category,
    label: &'static str,
}

#[get("/categories")]
pub async fn list_categories() -> impl Responder {
    let options: Vec<CategoryOption> = Category::ALL
        .into_iter()
        .map(|category| CategoryOption {
            value: category,
            label: category.label(),
        })
        .collect();
    HttpResponse::Ok().json(ApiResponse::success(options))
}

// ============================================================================
// PUBLIC DIRECTORY
// ============================================================================

#[get("/businesses")]
pub async fn search_businesses(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return read_error_response(&err),
    };

    match search::search_businesses(store, &query).await {
        Ok(businesses) => HttpResponse::Ok().json(ApiResponse::success(businesses)),
        Err(err) => read_error_response(&err),
    }
}

#[get("/businesses/featured")]
pub async fn featured_businesses(state: web::Data<AppState>) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return read_error_response(&err),
    };

    match search::featured_businesses(store).await {
        Ok(businesses) => HttpResponse::Ok().json(ApiResponse::success(businesses)),
        Err(err) => read_error_response(&err),
    }
}

#[post("/suggestions")]
pub async fn submit_suggestion(
    state: web::Data<AppState>,
    payload: web::Json<SubmitSuggestionRequest>,
) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return admin_error_response(&err),
    };

    match workflows::submit_suggestion(store.as_ref(), state.submission, &payload).await {
        Ok(SubmissionOutcome::Accepted(_)) | Ok(SubmissionOutcome::Discarded) => {
            HttpResponse::Ok().json(ActionResponse::with_message(SUBMITTED_MESSAGE))
        }
        Err(WorkflowError::Validation(err)) => {
            HttpResponse::BadRequest().json(ErrorBody::new(err.to_string()))
        }
        Err(_) => HttpResponse::InternalServerError().json(ErrorBody::new(SUBMIT_FAILED_MESSAGE)),
    }
}

// ============================================================================
// ADMIN MODERATION
// ============================================================================

#[get("/suggestions")]
pub async fn list_suggestions(
    state: web::Data<AppState>,
    query: web::Query<ReviewQueueQuery>,
) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return read_error_response(&err),
    };

    match workflows::list_review_queue(store.as_ref(), &state.classifier, query.q.as_deref()).await
    {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::success(items)),
        Err(err) => read_error_response(&err),
    }
}

#[post("/promote")]
pub async fn promote_suggestion(
    state: web::Data<AppState>,
    payload: web::Json<PromoteRequest>,
) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return admin_error_response(&err),
    };

    match workflows::promote_suggestion(store.as_ref(), &state.claims, &payload).await {
        Ok(_) => HttpResponse::Ok().json(ActionResponse::ok()),
        Err(err) => admin_error_response(&err),
    }
}

#[post("/reject")]
pub async fn reject_suggestion(
    state: web::Data<AppState>,
    payload: web::Json<RejectRequest>,
) -> impl Responder {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return admin_error_response(&err),
    };

    match workflows::reject_suggestion(store.as_ref(), &payload).await {
        Ok(_) => HttpResponse::Ok().json(ActionResponse::ok()),
        Err(err) => admin_error_response(&err),
    }
}
