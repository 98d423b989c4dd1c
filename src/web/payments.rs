use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use super::{form_data, parse_id, ActionResult, ActionState, ApiError, AppState, FormBody};
use crate::db::{PaymentRow, PendingPayment};
use crate::forms::payment::PaymentForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(save_payment))
        .route("/payments/pending", get(pending_payments))
        .route("/payments/{id}", delete(delete_payment))
        .route("/workers/{id}/payments", get(worker_payments))
}

/// GET /api/workers/{id}/payments
async fn worker_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PaymentRow>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_payments_by_worker(id).await?))
}

/// GET /api/payments/pending
async fn pending_payments(State(state): State<AppState>) -> Result<Json<Vec<PendingPayment>>, ApiError> {
    Ok(Json(state.db.fetch_pending_payments().await?))
}

/// POST /api/payments
///
/// Creates a payment, or updates the one named by `paymentId`.
async fn save_payment(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let form = PaymentForm::parse(&form_data(body))?;
    state.db.save_payment(&form).await?;
    let message = if form.id.is_some() {
        "Payment updated successfully."
    } else {
        "Payment created successfully."
    };
    Ok(Json(ActionState::success(message)))
}

/// DELETE /api/payments/{id}
async fn delete_payment(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_payment(id).await?;
    Ok(Json(ActionState::success("Payment deleted successfully.")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::super::router;
    use super::super::test_support::*;

    #[tokio::test]
    async fn payment_fields_are_validated() {
        let response = router(state())
            .oneshot(form_request(
                "POST",
                "/api/payments",
                "amount=-10&date=someday&status=late",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        let errors = &body["errors"];
        assert_eq!(errors["workerId"][0], "Worker is required.");
        assert_eq!(errors["amount"][0], "Amount must be a non-negative number.");
        assert_eq!(errors["date"][0], "A valid date is required.");
        assert_eq!(errors["status"][0], "Status must be one of: paid, pending, partial.");
    }

    #[tokio::test]
    async fn delete_rejects_malformed_id() {
        let response = router(state())
            .oneshot(empty_request("DELETE", "/api/payments/xyz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
