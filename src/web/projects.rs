use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use super::{form_data, parse_id, ActionResult, ActionState, ApiError, AppState, FormBody, ListParams, Page};
use crate::db::{ProjectDetail, ProjectOption, ProjectServiceRow, ProjectTableRow, WorkerShort};
use crate::forms::project::ProjectForm;
use crate::models::Service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/options", get(project_options))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{id}/services", get(project_services))
        .route("/projects/{id}/workers", get(project_workers))
        .route("/services", get(list_services))
}

/// GET /api/projects?query=&page=
async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ProjectTableRow>>, ApiError> {
    let items = state
        .db
        .fetch_filtered_projects(&params.query, params.page())
        .await?;
    let total_pages = state.db.fetch_projects_pages(&params.query).await?;
    Ok(Json(Page { items, total_pages }))
}

/// GET /api/projects/options
async fn project_options(State(state): State<AppState>) -> Result<Json<Vec<ProjectOption>>, ApiError> {
    Ok(Json(state.db.load_projects().await?))
}

/// GET /api/projects/{id}
async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_project_by_id(id).await?))
}

/// POST /api/projects
async fn create_project(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let form = ProjectForm::parse(&form_data(body))?;
    state.db.create_project(&form).await?;
    Ok(Json(ActionState::success("Project created successfully!")))
}

/// PUT /api/projects/{id}
async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: FormBody,
) -> ActionResult {
    let id = parse_id(&id)?;
    let form = ProjectForm::parse(&form_data(body))?;
    state.db.update_project(id, &form).await?;
    Ok(Json(ActionState::success("Project updated successfully!")))
}

/// DELETE /api/projects/{id}
async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_project(id).await?;
    Ok(Json(ActionState::success("Project deleted successfully.")))
}

/// GET /api/projects/{id}/services
async fn project_services(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProjectServiceRow>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_services_by_project(id).await?))
}

/// GET /api/projects/{id}/workers
async fn project_workers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<WorkerShort>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_workers_assigned_to_project(id).await?))
}

/// GET /api/services
async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.db.fetch_services().await?))
}
