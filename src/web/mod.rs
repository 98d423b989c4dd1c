//! HTTP surface. Reads answer with JSON bodies, mutations with an
//! [`ActionState`].

mod customers;
mod dashboard;
mod emails;
mod error;
mod invoices;
mod payments;
mod projects;
mod vacations;
mod work_logs;
mod workers;

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub use error::{parse_id, ApiError};

use crate::db::Database;
use crate::forms::{FieldErrors, FormData};
use crate::invoice_gen::InvoiceGenerator;
use crate::mailer::Mailer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub mailer: Mailer,
    pub generator: Arc<InvoiceGenerator>,
}

impl AppState {
    pub fn new(db: Database, mailer: Mailer, generator: InvoiceGenerator) -> Self {
        Self {
            db,
            mailer,
            generator: Arc::new(generator),
        }
    }
}

/// Outcome of a form action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionState {
    pub success: bool,
    pub message: String,
    pub errors: FieldErrors,
}

impl ActionState {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn invalid(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
        }
    }
}

pub type ActionResult = Result<Json<ActionState>, ApiError>;

/// `?query=..&page=..` of the paginated tables.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<i64>,
}

impl ListParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// One page of a table together with the page count for the same filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: i64,
}

/// Urlencoded form body as ordered key/value pairs.
pub type FormBody = Form<Vec<(String, String)>>;

pub(crate) fn form_data(Form(pairs): FormBody) -> FormData {
    FormData::new(pairs)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(customers::routes())
        .merge(projects::routes())
        .merge(workers::routes())
        .merge(invoices::routes())
        .merge(work_logs::routes())
        .merge(vacations::routes())
        .merge(payments::routes())
        .merge(dashboard::routes())
        .merge(emails::routes())
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "mail": state.mailer.is_configured(),
    }))
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn health_reports_mail_state() {
        let response = router(state())
            .oneshot(empty_request("GET", "/api/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mail"], false);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = router(state())
            .oneshot(empty_request("GET", "/api/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn action_state_shape() {
        let json = serde_json::to_value(ActionState::invalid(
            "Missing or invalid fields.",
            FieldErrors::single("name", "Name is required."),
        ))
        .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"]["name"][0], "Name is required.");
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(ListParams::default().page(), 1);
        assert_eq!(ListParams { query: String::new(), page: Some(-3) }.page(), 1);
    }
}
