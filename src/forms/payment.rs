use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{parse_date, parse_number, parse_uuid, required_id, FieldErrors, FormData};
use crate::models::PaymentStatus;
use crate::money;

/// A payment to save. `id` is set when an existing payment is edited.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentForm {
    pub id: Option<Uuid>,
    pub worker_id: Uuid,
    /// øre
    pub amount: i64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

impl PaymentForm {
    pub fn parse(form: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let id = match form.text("paymentId") {
            None => None,
            Some(raw) => {
                let id = parse_uuid(&raw);
                if id.is_none() {
                    errors.add("paymentId", "Invalid payment id.");
                }
                id
            }
        };
        let worker_id = required_id(form, "workerId", "Worker is required.", &mut errors);

        let amount = form.text("amount").as_deref().and_then(parse_number);
        match amount {
            Some(amount) if amount > money::MAX_AMOUNT => errors.add(
                "amount",
                format!("Amount cannot exceed {}.", money::MAX_AMOUNT),
            ),
            Some(amount) if amount >= 0.0 => {}
            _ => errors.add("amount", "Amount must be a non-negative number."),
        }

        let date = form.text("date").as_deref().and_then(parse_date);
        if date.is_none() {
            errors.add("date", "A valid date is required.");
        }

        let status = form
            .text("status")
            .and_then(|status| PaymentStatus::from_str(&status).ok());
        if status.is_none() {
            errors.add("status", "Status must be one of: paid, pending, partial.");
        }

        let notes = form.text("notes");

        match (worker_id, amount, date, status) {
            (Some(worker_id), Some(amount), Some(date), Some(status)) if errors.is_empty() => {
                Ok(Self {
                    id,
                    worker_id,
                    amount: money::to_minor(amount),
                    date,
                    status,
                    notes,
                })
            }
            _ => Err(errors),
        }
    }
}
