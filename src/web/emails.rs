use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use super::{ActionResult, ActionState, ApiError, AppState};
use crate::forms::email::{EmailDraft, EmailForm, UploadedFile, MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};
use crate::forms::FieldErrors;
use crate::mailer::OutgoingMail;

// room for every attachment at its size limit plus the text fields
const BODY_LIMIT: usize = (MAX_ATTACHMENTS + 1) * MAX_ATTACHMENT_BYTES + 64 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/emails",
        post(send_email).layer(DefaultBodyLimit::max(BODY_LIMIT)),
    )
}

fn unreadable(err: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::warn!("rejected email form: {}", err);
    FieldErrors::single("form", "Could not read the submitted form.").into()
}

async fn read_draft(mut multipart: Multipart) -> Result<EmailDraft, ApiError> {
    let mut draft = EmailDraft::default();

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "receiver" => draft.receiver = field.text().await.map_err(unreadable)?,
            "subject" => draft.subject = field.text().await.map_err(unreadable)?,
            "message" => draft.message = field.text().await.map_err(unreadable)?,
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(unreadable)?;
                // browsers post an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                draft.files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(draft)
}

/// POST /api/emails
///
/// Multipart fields `receiver`, `subject`, `message` and up to five `files`.
async fn send_email(State(state): State<AppState>, multipart: Multipart) -> ActionResult {
    let draft = read_draft(multipart).await?;
    let email = EmailForm::validate(draft)?;
    state.mailer.send(OutgoingMail::from(email)).await?;
    Ok(Json(ActionState::success("Email sent successfully.")))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::super::router;
    use super::super::test_support::*;

    const BOUNDARY: &str = "maler-boundary";

    fn multipart(parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file, value) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file {
                Some((file_name, content_type)) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/api/emails")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn invalid_message_is_422() {
        let request = multipart(&[
            ("receiver", None, "not-an-address"),
            ("subject", None, "2024"),
            ("message", None, "Hej"),
            ("files", Some(("setup.exe", "application/x-msdownload")), "MZ"),
        ]);
        let response = router(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["errors"]["receiver"][0], "Invalid email address");
        assert_eq!(body["errors"]["subject"][0], "Subject must contain at least one letter");
        assert_eq!(body["errors"]["files"][0], "setup.exe: Invalid file type.");
    }

    #[tokio::test]
    async fn valid_message_without_smtp_is_unavailable() {
        let request = multipart(&[
            ("receiver", None, "kunde@firma.dk"),
            ("subject", None, "Tilbud"),
            ("message", None, "Se vedhæftede tilbud."),
            ("files", Some(("", "application/octet-stream")), ""),
        ]);
        let response = router(state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }
}
