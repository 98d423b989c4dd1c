use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use super::{form_data, parse_id, today, ActionResult, ActionState, ApiError, AppState, FormBody, ListParams, Page};
use crate::db::{WorkerDetail, WorkerShort, WorkerTableRow};
use crate::forms::worker::WorkerForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workers", get(list_workers).post(create_worker))
        .route("/workers/options", get(worker_options))
        .route(
            "/workers/{id}",
            get(get_worker).put(update_worker).delete(delete_worker),
        )
}

/// GET /api/workers?query=&page=
async fn list_workers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<WorkerTableRow>>, ApiError> {
    let items = state
        .db
        .fetch_filtered_workers(&params.query, params.page())
        .await?;
    let total_pages = state.db.fetch_workers_pages(&params.query).await?;
    Ok(Json(Page { items, total_pages }))
}

/// GET /api/workers/options
async fn worker_options(State(state): State<AppState>) -> Result<Json<Vec<WorkerShort>>, ApiError> {
    Ok(Json(state.db.load_workers().await?))
}

/// GET /api/workers/{id}
async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkerDetail>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_worker_by_id(id).await?))
}

/// POST /api/workers
async fn create_worker(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let (worker, address) = WorkerForm::parse_with_address(&form_data(body), today())?;
    state.db.create_worker(&worker, &address).await?;
    Ok(Json(ActionState::success("Worker created successfully!")))
}

/// PUT /api/workers/{id}
async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: FormBody,
) -> ActionResult {
    let id = parse_id(&id)?;
    let (worker, address) = WorkerForm::parse_with_address(&form_data(body), today())?;
    state.db.update_worker(id, &worker, &address).await?;
    Ok(Json(ActionState::success("Worker updated successfully!")))
}

/// DELETE /api/workers/{id}
async fn delete_worker(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_worker(id).await?;
    Ok(Json(ActionState::success("Worker deleted successfully.")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::super::router;
    use super::super::test_support::*;

    #[tokio::test]
    async fn negative_rate_is_rejected() {
        let body = "name=Mikkel&email=mikkel@example.dk&phone=12345678&position=Maler\
            &dailyRate=-5&street=Vej+1&postalCode=2200&city=K%C3%B8benhavn";
        let response = router(state())
            .oneshot(form_request("POST", "/api/workers", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["dailyRate"][0], "Daily rate cannot be negative.");
    }
}
