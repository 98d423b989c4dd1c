use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::{today, ApiError, AppState};
use crate::db::{CardData, LatestInvoice, MonthlyRevenue};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/cards", get(cards))
        .route("/dashboard/revenue", get(revenue))
        .route("/dashboard/latest-invoices", get(latest_invoices))
}

/// GET /api/dashboard/cards
async fn cards(State(state): State<AppState>) -> Result<Json<CardData>, ApiError> {
    Ok(Json(state.db.fetch_card_data().await?))
}

/// GET /api/dashboard/revenue
async fn revenue(State(state): State<AppState>) -> Result<Json<Vec<MonthlyRevenue>>, ApiError> {
    Ok(Json(state.db.fetch_revenue(today()).await?))
}

/// GET /api/dashboard/latest-invoices
async fn latest_invoices(State(state): State<AppState>) -> Result<Json<Vec<LatestInvoice>>, ApiError> {
    Ok(Json(state.db.fetch_latest_invoices().await?))
}
