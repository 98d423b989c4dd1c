use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::Database;
use crate::error::{AppError, Result};
use crate::forms::payment::PaymentForm;
use crate::models::{Payment, PaymentStatus};
use crate::money::format_currency;

/// A payment with its amount formatted for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRow {
    #[serde(flatten)]
    pub payment: Payment,
    pub amount_formatted: String,
}

impl From<Payment> for PaymentRow {
    fn from(payment: Payment) -> Self {
        Self {
            amount_formatted: format_currency(payment.amount),
            payment,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub worker_name: String,
    pub amount: i64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

impl Database {
    // Payment operations

    /// Create a payment, or update it when the form carries an id
    pub async fn save_payment(&self, form: &PaymentForm) -> Result<Payment> {
        let payment = match form.id {
            Some(id) => sqlx::query_as::<_, Payment>(
                r#"
                UPDATE payments
                SET amount = $1, date = $2, status = $3, notes = $4
                WHERE id = $5
                RETURNING *
                "#,
            )
            .bind(form.amount)
            .bind(form.date)
            .bind(form.status)
            .bind(&form.notes)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(AppError::NotFound("Payment"))?,
            None => {
                sqlx::query_as::<_, Payment>(
                    r#"
                    INSERT INTO payments (id, worker_id, amount, date, status, notes)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(form.worker_id)
                .bind(form.amount)
                .bind(form.date)
                .bind(form.status)
                .bind(&form.notes)
                .fetch_one(self.get_pool())
                .await?
            }
        };

        tracing::info!("saved payment {} for worker {}", payment.id, payment.worker_id);
        Ok(payment)
    }

    pub async fn fetch_payments_by_worker(&self, worker_id: Uuid) -> Result<Vec<PaymentRow>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE worker_id = $1 ORDER BY date DESC",
        )
        .bind(worker_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(payments.into_iter().map(PaymentRow::from).collect())
    }

    pub async fn fetch_pending_payments(&self) -> Result<Vec<PendingPayment>> {
        let payments = sqlx::query_as::<_, PendingPayment>(
            r#"
            SELECT p.id, p.worker_id, w.name AS worker_name, p.amount, p.date, p.status, p.notes
            FROM payments p
            JOIN workers w ON w.id = p.worker_id
            WHERE p.status = 'pending'
            ORDER BY p.date ASC
            "#,
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(payments)
    }

    pub async fn delete_payment(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Payment"));
        }
        Ok(())
    }

    /// Payments of a worker dated within `[from, to)`
    pub(crate) async fn payments_between(
        &self,
        worker_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE worker_id = $1 AND date >= $2 AND date < $3
            ORDER BY date ASC
            "#,
        )
        .bind(worker_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.get_pool())
        .await?;

        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_formats_amount() {
        let row = PaymentRow::from(Payment {
            id: Uuid::nil(),
            worker_id: Uuid::nil(),
            amount: 1234550,
            date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            status: PaymentStatus::Paid,
            notes: None,
        });
        assert_eq!(row.amount_formatted, "12.345,50 kr.");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["amount"], 1234550);
        assert_eq!(json["status"], "paid");
        assert_eq!(json["amountFormatted"], "12.345,50 kr.");
    }
}
