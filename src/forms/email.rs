use super::{is_valid_email, FieldErrors};

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/zip",
    "application/x-rar-compressed",
];

/// A file received with the email form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Raw email form fields, collected from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct EmailDraft {
    pub receiver: String,
    pub subject: String,
    pub message: String,
    pub files: Vec<UploadedFile>,
}

/// A message that passed validation and can be handed to the mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailForm {
    pub receiver: String,
    pub subject: String,
    pub message: String,
    pub files: Vec<UploadedFile>,
}

fn mime_allowed(content_type: &str) -> bool {
    // ignore parameters such as `; charset=utf-8`
    let essence = content_type
        .parse::<mime::Mime>()
        .map(|mime| mime.essence_str().to_ascii_lowercase())
        .unwrap_or_default();
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

impl EmailForm {
    pub fn validate(draft: EmailDraft) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let receiver = draft.receiver.trim().to_string();
        if receiver.is_empty() {
            errors.add("receiver", "Receiver is required");
        } else if !is_valid_email(&receiver) {
            errors.add("receiver", "Invalid email address");
        }

        let subject = draft.subject.trim().to_string();
        if subject.is_empty() {
            errors.add("subject", "Subject is required");
        } else if !subject.chars().any(|c| c.is_ascii_alphabetic()) {
            errors.add("subject", "Subject must contain at least one letter");
        }

        let message = draft.message.trim().to_string();
        if message.is_empty() {
            errors.add("message", "Message is required");
        }

        if draft.files.len() > MAX_ATTACHMENTS {
            errors.add("files", "You can upload a maximum of 5 files.");
        }
        for file in &draft.files {
            if !mime_allowed(&file.content_type) {
                errors.add("files", format!("{}: Invalid file type.", file.file_name));
            }
            if file.bytes.len() > MAX_ATTACHMENT_BYTES {
                errors.add("files", format!("{}: File must be smaller than 10MB.", file.file_name));
            }
        }

        errors.into_result(|| Self {
            receiver,
            subject,
            message,
            files: draft.files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; size],
        }
    }

    fn draft() -> EmailDraft {
        EmailDraft {
            receiver: " kunde@firma.dk ".into(),
            subject: "Tilbud 2024".into(),
            message: "Hej, se vedhæftede tilbud.".into(),
            files: vec![file("tilbud.pdf", "application/pdf", 1024)],
        }
    }

    #[test]
    fn accepts_a_normal_message() {
        let email = EmailForm::validate(draft()).unwrap();
        assert_eq!(email.receiver, "kunde@firma.dk");
        assert_eq!(email.files.len(), 1);
    }

    #[test]
    fn subject_needs_a_letter() {
        let mut d = draft();
        d.subject = "2024 - 06".into();
        let errors = EmailForm::validate(d).unwrap_err();
        assert_eq!(
            errors.get("subject"),
            Some(&["Subject must contain at least one letter".to_string()][..])
        );
    }

    #[test]
    fn empty_fields() {
        let errors = EmailForm::validate(EmailDraft::default()).unwrap_err();
        assert_eq!(errors.get("receiver"), Some(&["Receiver is required".to_string()][..]));
        assert!(errors.contains("subject"));
        assert!(errors.contains("message"));
        assert!(!errors.contains("files"));
    }

    #[test]
    fn attachment_limits() {
        let mut d = draft();
        d.files = vec![
            file("a.txt", "text/plain; charset=utf-8", 10),
            file("b.exe", "application/x-msdownload", 10),
            file("c.png", "image/png", MAX_ATTACHMENT_BYTES + 1),
            file("d.png", "image/png", 10),
            file("e.png", "image/png", 10),
            file("f.png", "image/png", 10),
        ];
        let messages = EmailForm::validate(d).unwrap_err().get("files").unwrap().to_vec();

        assert_eq!(
            messages,
            vec![
                "You can upload a maximum of 5 files.".to_string(),
                "b.exe: Invalid file type.".to_string(),
                "c.png: File must be smaller than 10MB.".to_string(),
            ]
        );
    }
}
