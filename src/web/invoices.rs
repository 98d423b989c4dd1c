use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{form_data, parse_id, today, ActionResult, ActionState, ApiError, AppState, FormBody, ListParams, Page};
use crate::db::{InvoiceDetail, InvoiceTableRow};
use crate::forms::invoice::InvoiceForm;
use crate::invoice_gen::InvoiceGenerator;
use crate::mailer::{MailAttachment, OutgoingMail};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/pdf", get(invoice_pdf))
        .route("/invoices/{id}/send", post(send_invoice))
}

/// GET /api/invoices?query=&page=
async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<InvoiceTableRow>>, ApiError> {
    let items = state
        .db
        .fetch_filtered_invoices(&params.query, params.page())
        .await?;
    let total_pages = state.db.fetch_invoices_pages(&params.query).await?;
    Ok(Json(Page { items, total_pages }))
}

/// GET /api/invoices/{id}
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceDetail>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_invoice_by_id(id).await?))
}

/// POST /api/invoices
async fn create_invoice(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let form = InvoiceForm::parse(&form_data(body))?;
    state.db.create_invoice(&form, today()).await?;
    Ok(Json(ActionState::success("Invoice created successfully!")))
}

/// PUT /api/invoices/{id}
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: FormBody,
) -> ActionResult {
    let id = parse_id(&id)?;
    let form = InvoiceForm::parse(&form_data(body))?;
    state.db.update_invoice(id, &form).await?;
    Ok(Json(ActionState::success("Invoice updated successfully!")))
}

/// DELETE /api/invoices/{id}
async fn delete_invoice(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    state.db.delete_invoice(id).await?;
    Ok(Json(ActionState::success("Invoice deleted successfully.")))
}

/// GET /api/invoices/{id}/pdf
async fn invoice_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let detail = state.db.fetch_invoice_by_id(id).await?;
    let pdf = state.generator.generate_pdf(&detail.document(), today());

    let disposition = format!(
        "attachment; filename=\"{}\"",
        InvoiceGenerator::file_name(id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

/// POST /api/invoices/{id}/send
///
/// Renders the invoice and mails it to the customer.
async fn send_invoice(State(state): State<AppState>, Path(id): Path<String>) -> ActionResult {
    let id = parse_id(&id)?;
    let detail = state.db.fetch_invoice_by_id(id).await?;
    let document = detail.document();

    let mail = OutgoingMail {
        to: document.customer_email.clone(),
        subject: state.generator.email_subject(),
        body: state.generator.email_body(&document.customer_name),
        attachments: vec![MailAttachment {
            file_name: InvoiceGenerator::file_name(id),
            content_type: mime::APPLICATION_PDF.to_string(),
            bytes: state.generator.generate_pdf(&document, today()),
        }],
    };
    state.mailer.send(mail).await?;

    tracing::info!("invoice {} sent to {}", id, document.customer_email);
    Ok(Json(ActionState::success(format!(
        "Invoice sent to {}.",
        document.customer_email
    ))))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::super::router;
    use super::super::test_support::*;

    #[tokio::test]
    async fn create_requires_project_and_status() {
        let response = router(state())
            .oneshot(form_request(
                "POST",
                "/api/invoices",
                "status=overdue&services[0][serviceName]=Maling&services[0][amount]=100",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["projectId"][0], "Project is required.");
        assert_eq!(body["errors"]["status"][0], "Status must be either 'pending' or 'paid'.");
    }

    #[tokio::test]
    async fn pdf_of_malformed_id() {
        let response = router(state())
            .oneshot(empty_request("GET", "/api/invoices/123/pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
