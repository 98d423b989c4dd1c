use chrono::NaiveDate;
use uuid::Uuid;

use super::{parse_date, parse_uuid, required_id, FieldErrors, FormData};

#[derive(Debug, Clone, PartialEq)]
pub struct VacationForm {
    pub id: Option<Uuid>,
    pub worker_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub approved: bool,
    pub reason: Option<String>,
}

impl VacationForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let id = match form.text("vacationId") {
            None => None,
            Some(raw) => {
                let id = parse_uuid(&raw);
                if id.is_none() {
                    errors.add("vacationId", "Invalid vacation id.");
                }
                id
            }
        };
        let worker_id = required_id(form, "workerId", "Worker is required.", &mut errors);

        let start_date = form.text("startDate").as_deref().and_then(parse_date);
        if start_date.is_none() {
            errors.add("startDate", "Start date is required.");
        }
        let end_date = form.text("endDate").as_deref().and_then(parse_date);
        if end_date.is_none() {
            errors.add("endDate", "End date is required.");
        }
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("endDate", "End date cannot be before the start date.");
            }
        }

        let approved = form.get("approved") == Some("on");
        let reason = form.text("reason");

        match (worker_id, start_date, end_date) {
            (Some(worker_id), Some(start_date), Some(end_date)) if errors.is_empty() => Ok(Self {
                id,
                worker_id,
                start_date,
                end_date,
                approved,
                reason,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    const WORKER: &str = "0b7f4f3e-2a51-4b8e-8d6f-1e2f3a4b5c6d";

    #[test]
    fn approved_only_when_on() {
        let base = [
            ("workerId", WORKER),
            ("startDate", "2024-07-08"),
            ("endDate", "2024-07-19"),
            ("reason", "Sommerferie"),
        ];
        let vacation = VacationForm::parse(&form(&base)).unwrap();
        assert!(!vacation.approved);
        assert_eq!(vacation.reason.as_deref(), Some("Sommerferie"));

        let mut pairs = base.to_vec();
        pairs.push(("approved", "on"));
        assert!(VacationForm::parse(&form(&pairs)).unwrap().approved);
    }

    #[test]
    fn single_day_is_allowed_reversed_is_not() {
        assert!(
            VacationForm::parse(&form(&[
                ("workerId", WORKER),
                ("startDate", "2024-07-08"),
                ("endDate", "2024-07-08"),
            ]))
            .is_ok()
        );

        let errors = VacationForm::parse(&form(&[
            ("workerId", WORKER),
            ("startDate", "2024-07-08"),
            ("endDate", "2024-07-01"),
        ]))
        .unwrap_err();
        assert!(errors.contains("endDate"));
    }
}
