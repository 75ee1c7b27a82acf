use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    Agency, AgencyId, CycleDraft, CycleId, CycleStatus, EvaluationSubmission, User, UserId,
};
use super::repository::{CycleStore, DirectoryStore, EvaluationStore, RepositoryError};
use super::service::{ReviewService, ReviewServiceError};

/// Router builder exposing the peer-review HTTP surface.
pub fn review_router<D, C, E>(service: Arc<ReviewService<D, C, E>>) -> Router
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/cycles",
            get(list_cycles_handler::<D, C, E>).post(create_cycle_handler::<D, C, E>),
        )
        .route("/api/v1/cycles/:cycle_id", put(update_cycle_handler::<D, C, E>))
        .route(
            "/api/v1/cycles/:cycle_id/status",
            post(set_status_handler::<D, C, E>),
        )
        .route(
            "/api/v1/cycles/:cycle_id/evaluations",
            post(submit_handler::<D, C, E>),
        )
        .route(
            "/api/v1/cycles/:cycle_id/scores",
            get(scores_handler::<D, C, E>),
        )
        .route(
            "/api/v1/cycles/:cycle_id/completion",
            get(completion_handler::<D, C, E>),
        )
        .route(
            "/api/v1/cycles/:cycle_id/board",
            get(board_handler::<D, C, E>),
        )
        .route(
            "/api/v1/cycles/:cycle_id/digest",
            get(digest_handler::<D, C, E>),
        )
        .route("/api/v1/agencies", post(add_agency_handler::<D, C, E>))
        .route("/api/v1/users", post(add_user_handler::<D, C, E>))
        .route(
            "/api/v1/users/:user_id",
            delete(remove_user_handler::<D, C, E>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgencyQuery {
    pub agency_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoresQuery {
    pub evaluatee_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorQuery {
    pub actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub status: CycleStatus,
}

pub(crate) async fn list_cycles_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Query(query): Query<AgencyQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.visible_cycles(&AgencyId(query.agency_id)) {
        Ok(cycles) => (StatusCode::OK, axum::Json(cycles)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_cycle_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    axum::Json(draft): axum::Json<CycleDraft>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.create_cycle(draft) {
        Ok(cycle) => (StatusCode::CREATED, axum::Json(cycle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_cycle_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    axum::Json(draft): axum::Json<CycleDraft>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.update_cycle(&CycleId(cycle_id), draft) {
        Ok(cycle) => (StatusCode::OK, axum::Json(cycle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn set_status_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.set_cycle_status(&CycleId(cycle_id), change.status) {
        Ok(cycle) => (StatusCode::OK, axum::Json(cycle)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    axum::Json(submission): axum::Json<EvaluationSubmission>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.submit_evaluation(&CycleId(cycle_id), submission) {
        Ok(evaluation) => (StatusCode::CREATED, axum::Json(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scores_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    Query(query): Query<ScoresQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.scorecard(&CycleId(cycle_id), &UserId(query.evaluatee_id)) {
        Ok(card) => (StatusCode::OK, axum::Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn completion_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    Query(query): Query<AgencyQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.completion(&CycleId(cycle_id), &AgencyId(query.agency_id)) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn board_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    Query(query): Query<AgencyQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.board(&CycleId(cycle_id), &AgencyId(query.agency_id)) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn digest_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(cycle_id): Path<String>,
    Query(query): Query<AgencyQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.digest(&CycleId(cycle_id), &AgencyId(query.agency_id)) {
        Ok(digest) => (StatusCode::OK, axum::Json(digest)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_agency_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    axum::Json(agency): axum::Json<Agency>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.add_agency(agency) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_user_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    axum::Json(user): axum::Json<User>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.add_user(user) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_user_handler<D, C, E>(
    State(service): State<Arc<ReviewService<D, C, E>>>,
    Path(user_id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    D: DirectoryStore + 'static,
    C: CycleStore + 'static,
    E: EvaluationStore + 'static,
{
    match service.remove_user(&UserId(query.actor_id), &UserId(user_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

/// Maps service failures onto the HTTP surface: missing records are 404,
/// rule violations are 422, duplicate submissions are 409, and storage
/// outages are 500.
fn error_response(error: ReviewServiceError) -> Response {
    let status = match &error {
        ReviewServiceError::UnknownCycle(_)
        | ReviewServiceError::UnknownUser(_)
        | ReviewServiceError::UnknownAgency(_)
        | ReviewServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewServiceError::Scope(_)
        | ReviewServiceError::Config(_)
        | ReviewServiceError::CycleNotConfigured(_)
        | ReviewServiceError::UnknownCriterion(_)
        | ReviewServiceError::InvalidScore { .. }
        | ReviewServiceError::IncompleteScores { .. }
        | ReviewServiceError::SelfRemoval => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewServiceError::DuplicateSubmission
        | ReviewServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ReviewServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
