use uuid::Uuid;

use super::{required_id, FieldErrors, FormData};
use crate::work_log::SubmittedDay;

/// A submitted work-log grid for one worker on one project.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLogForm {
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub days: Vec<SubmittedDay>,
}

/// Decodes the grid JSON posted in the `entries` field.
pub fn parse_work_log_entries(json: &str) -> Result<Vec<SubmittedDay>, FieldErrors> {
    serde_json::from_str(json).map_err(|err| {
        tracing::debug!("rejected work log entries: {}", err);
        FieldErrors::single("date", "Could not parse work entries.")
    })
}

impl WorkLogForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let days = match form.text("entries") {
            None => Vec::new(),
            Some(json) => parse_work_log_entries(&json)?,
        };

        let mut errors = FieldErrors::new();
        let worker_id = required_id(form, "workerId", "Worker is required.", &mut errors);
        let project_id = required_id(form, "projectId", "Project is required.", &mut errors);
        if !days.iter().any(|day| day.worked) {
            errors.add("date", "At least one entry must be selected.");
        }

        match (worker_id, project_id) {
            (Some(worker_id), Some(project_id)) if errors.is_empty() => Ok(Self {
                worker_id,
                project_id,
                days,
            }),
            _ => Err(errors),
        }
    }
}
