use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use super::{form_data, parse_id, ActionResult, ActionState, ApiError, AppState, FormBody, ListParams, Page};
use crate::db::{CustomerDetail, CustomerOption, CustomerTableRow};
use crate::forms::customer::CustomerForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/options", get(customer_options))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

/// GET /api/customers?query=&page=
async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<CustomerTableRow>>, ApiError> {
    let items = state
        .db
        .fetch_filtered_customers(&params.query, params.page())
        .await?;
    let total_pages = state.db.fetch_customers_pages(&params.query).await?;
    Ok(Json(Page { items, total_pages }))
}

/// GET /api/customers/options
async fn customer_options(State(state): State<AppState>) -> Result<Json<Vec<CustomerOption>>, ApiError> {
    Ok(Json(state.db.load_customers().await?))
}

/// GET /api/customers/{id}
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_customer_by_id(id).await?))
}

/// POST /api/customers
async fn create_customer(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let (customer, address) = CustomerForm::parse_with_address(&form_data(body))?;
    state.db.create_customer(&customer, &address).await?;
    Ok(Json(ActionState::success("Customer created successfully!")))
}

/// PUT /api/customers/{id}
async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: FormBody,
) -> ActionResult {
    let id = parse_id(&id)?;
    let (customer, address) = CustomerForm::parse_with_address(&form_data(body))?;
    state.db.update_customer(id, &customer, &address).await?;
    Ok(Json(ActionState::success("Customer updated successfully!")))
}

/// DELETE /api/customers/{id}
async fn delete_customer(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_customer(id).await?;
    Ok(Json(ActionState::success(
        "Customer and associated projects successfully marked as deleted.",
    )))
}
