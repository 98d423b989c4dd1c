use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{form_data, parse_id, ActionResult, ActionState, ApiError, AppState, FormBody};
use crate::forms::vacation::VacationForm;
use crate::models::Vacation;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vacations", post(save_vacation))
        .route("/vacations/{id}", delete(delete_vacation))
        .route("/workers/{id}/vacations", get(worker_vacations))
}

#[derive(Debug, Deserialize)]
struct VacationParams {
    year: Option<i32>,
}

/// GET /api/workers/{id}/vacations?year=
///
/// Without a year every vacation is listed, newest first.
async fn worker_vacations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<VacationParams>,
) -> Result<Json<Vec<Vacation>>, ApiError> {
    let id = parse_id(&id)?;
    let vacations = match params.year {
        Some(year) => state.db.fetch_vacations_by_year(id, year).await?,
        None => state.db.fetch_vacations_by_worker(id).await?,
    };
    Ok(Json(vacations))
}

/// POST /api/vacations
///
/// Creates a vacation, or updates the one named by `vacationId`.
async fn save_vacation(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let form = VacationForm::parse(&form_data(body))?;
    state.db.save_vacation(&form).await?;
    let message = if form.id.is_some() {
        "Vacation updated successfully."
    } else {
        "Vacation created successfully."
    };
    Ok(Json(ActionState::success(message)))
}

/// DELETE /api/vacations/{id}
async fn delete_vacation(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_vacation(id).await?;
    Ok(Json(ActionState::success("Vacation deleted successfully.")))
}
