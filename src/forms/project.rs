use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use super::address::{with_address, AddressForm};
use super::services::{parse_indexed_services, validate_lines, LineRules, ServiceLine};
use super::{parse_date, parse_uuid, required_id, required_text, FieldErrors, FormData};
use crate::models::ProjectStatus;

/// A validated project submission: project fields, address, planned
/// service lines and the workers to assign.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub customer_id: Uuid,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub address: AddressForm,
    pub services: Vec<ServiceLine>,
    pub worker_ids: Vec<Uuid>,
}

const INVALID_STATUS: &str =
    "Invalid status. Must be one of: active, pending, stalled, completed, cancelled.";

struct ProjectFields {
    name: String,
    customer_id: Option<Uuid>,
    status: Option<ProjectStatus>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

fn parse_fields(form: &FormData) -> Result<ProjectFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_text(form, "name", "Name is required.", &mut errors);
    let customer_id = required_id(form, "customerId", "Customer is required.", &mut errors);

    let start_date = match form.text("startDate") {
        None => {
            errors.add("startDate", "Start date is required.");
            None
        }
        Some(raw) => {
            let date = parse_date(&raw);
            if date.is_none() {
                errors.add("startDate", "Invalid start date.");
            }
            date
        }
    };

    let end_date = match form.text("endDate") {
        None => None,
        Some(raw) => {
            let date = parse_date(&raw);
            if date.is_none() {
                errors.add("endDate", "Invalid end date.");
            }
            date
        }
    };
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            errors.add("endDate", "End date cannot be before the start date.");
        }
    }

    let status = match form.text("status") {
        None => {
            errors.add("status", "Status is required.");
            None
        }
        Some(raw) => {
            let status = ProjectStatus::from_str(&raw).ok();
            if status.is_none() {
                errors.add("status", INVALID_STATUS);
            }
            status
        }
    };

    errors.into_result(|| ProjectFields {
        name,
        customer_id,
        status,
        start_date,
        end_date,
    })
}

impl ProjectForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let fields = parse_fields(form);
        let (fields, address) = with_address(form, fields)?;
        let services = validate_lines(parse_indexed_services(form.pairs()), LineRules::Project)?;

        let mut worker_ids = Vec::new();
        let mut errors = FieldErrors::new();
        for raw in form.get_all("workerIds") {
            if raw.trim().is_empty() {
                continue;
            }
            match parse_uuid(raw) {
                Some(id) if !worker_ids.contains(&id) => worker_ids.push(id),
                Some(_) => {}
                None => errors.add("workerIds", "Invalid worker id."),
            }
        }

        // every Option below was checked by `parse_fields`
        match (fields.customer_id, fields.status, fields.start_date) {
            (Some(customer_id), Some(status), Some(start_date)) if errors.is_empty() => Ok(Self {
                name: fields.name,
                customer_id,
                status,
                start_date,
                end_date: fields.end_date,
                address,
                services,
                worker_ids,
            }),
            _ => Err(errors),
        }
    }

    /// Planned price in øre: `Σ round(unit * quantity * 100)`.
    pub fn planned_price(&self) -> i64 {
        crate::money::invoice_total(self.services.iter().map(|s| (s.amount, s.quantity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::services::ServiceRef;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    const CUSTOMER: &str = "6f1c3a55-9c2e-4c36-9d8e-3f3b1a1c2d4e";
    const WORKER: &str = "0b7f4f3e-2a51-4b8e-8d6f-1e2f3a4b5c6d";

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("name", "Facade renovering"),
            ("customerId", CUSTOMER),
            ("status", "active"),
            ("startDate", "2024-06-03"),
            ("endDate", "2024-06-14"),
            ("street", "Nørregade 7"),
            ("postalCode", "1165"),
            ("city", "København"),
            ("services[0].serviceName", "Maling"),
            ("services[0].quantity", "2.5"),
            ("services[0].amount", "400"),
            ("workerIds", WORKER),
            ("workerIds", WORKER),
        ]
    }

    #[test]
    fn parses_full_submission() {
        let project = ProjectForm::parse(&form(&valid())).unwrap();

        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.end_date, NaiveDate::from_ymd_opt(2024, 6, 14));
        assert_eq!(project.services[0].service, ServiceRef::Name("Maling".into()));
        assert_eq!(project.worker_ids.len(), 1);
        assert_eq!(project.planned_price(), 100000);
    }

    #[test]
    fn unknown_status_lists_the_choices() {
        let mut pairs = valid();
        pairs[2] = ("status", "archived");
        let errors = ProjectForm::parse(&form(&pairs)).unwrap_err();
        assert_eq!(errors.get("status"), Some(&[INVALID_STATUS.to_string()][..]));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut pairs = valid();
        pairs[4] = ("endDate", "2024-06-01");
        let errors = ProjectForm::parse(&form(&pairs)).unwrap_err();
        assert!(errors.contains("endDate"));
    }

    #[test]
    fn missing_fields_and_address_reported_together() {
        let errors = ProjectForm::parse(&form(&[("status", "active")])).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("customerId"));
        assert!(errors.contains("startDate"));
        assert!(errors.contains("address.street"));
    }

    #[test]
    fn open_ended_project_without_services() {
        let project = ProjectForm::parse(&form(&[
            ("name", "Trappeopgang"),
            ("customerId", CUSTOMER),
            ("status", "pending"),
            ("startDate", "2024-08-01"),
            ("street", "Vej 1"),
            ("postalCode", "2700"),
            ("city", "Brønshøj"),
        ]))
        .unwrap();
        assert_eq!(project.end_date, None);
        assert!(project.services.is_empty());
        assert_eq!(project.planned_price(), 0);
    }
}
