use std::str::FromStr;

use uuid::Uuid;

use super::services::{parse_indexed_services, validate_lines, LineRules, ServiceLine};
use super::{required_id, FieldErrors, FormData};
use crate::models::InvoiceStatus;
use crate::money;

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceForm {
    pub project_id: Uuid,
    pub status: InvoiceStatus,
    pub services: Vec<ServiceLine>,
}

impl InvoiceForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let project_id = required_id(form, "projectId", "Project is required.", &mut errors);
        let status = form
            .text("status")
            .and_then(|status| InvoiceStatus::from_str(&status).ok());
        if status.is_none() {
            errors.add("status", "Status must be either 'pending' or 'paid'.");
        }

        let services = match validate_lines(parse_indexed_services(form.pairs()), LineRules::Invoice) {
            Ok(services) => services,
            Err(line_errors) => {
                for message in line_errors.get("services").unwrap_or_default() {
                    errors.add("services", message.clone());
                }
                Vec::new()
            }
        };

        match (project_id, status) {
            (Some(project_id), Some(status)) if errors.is_empty() => Ok(Self {
                project_id,
                status,
                services,
            }),
            _ => Err(errors),
        }
    }

    /// Invoice total in øre.
    pub fn total_amount(&self) -> i64 {
        money::invoice_total(self.services.iter().map(|s| (s.amount, s.quantity)))
    }
}
