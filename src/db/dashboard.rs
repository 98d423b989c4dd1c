use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::Database;
use crate::error::Result;
use crate::models::InvoiceStatus;
use crate::money::format_currency;

const REVENUE_MONTHS: i32 = 12;
const LATEST_INVOICES: i64 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LatestInvoice {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: InvoiceStatus,
    pub total_amount: i64,
    pub project_name: String,
    pub customer_name: String,
    pub customer_email: String,
}

/// First day of the month `back` months before `today`'s month.
fn months_back(today: NaiveDate, back: i32) -> Option<NaiveDate> {
    let index = today.year() * 12 + today.month0() as i32 - back;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

/// The twelve months ending with `today`'s month, oldest first, with
/// months missing from `totals` reported as zero.
fn revenue_series(today: NaiveDate, totals: &HashMap<String, i64>) -> Vec<MonthlyRevenue> {
    (0..REVENUE_MONTHS)
        .rev()
        .filter_map(|back| months_back(today, back))
        .map(|first| {
            let month = first.format("%Y-%m").to_string();
            let revenue = totals.get(&month).copied().unwrap_or(0);
            MonthlyRevenue { month, revenue }
        })
        .collect()
}

impl Database {
    // Dashboard operations
    pub async fn fetch_card_data(&self) -> Result<CardData> {
        let number_of_invoices: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE is_deleted = FALSE")
                .fetch_one(self.get_pool())
                .await?;
        let number_of_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_deleted = FALSE")
                .fetch_one(self.get_pool())
                .await?;

        let (paid, pending): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'paid' THEN total_amount ELSE 0 END), 0)::BIGINT,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN total_amount ELSE 0 END), 0)::BIGINT
            FROM invoices
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(self.get_pool())
        .await?;

        Ok(CardData {
            number_of_invoices,
            number_of_customers,
            total_paid_invoices: format_currency(paid),
            total_pending_invoices: format_currency(pending),
        })
    }

    /// Paid revenue of the last twelve months up to `today`
    pub async fn fetch_revenue(&self, today: NaiveDate) -> Result<Vec<MonthlyRevenue>> {
        let since = months_back(today, REVENUE_MONTHS - 1).unwrap_or(today);
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT TO_CHAR(date, 'YYYY-MM') AS month, COALESCE(SUM(total_amount), 0)::BIGINT
            FROM invoices
            WHERE status = 'paid' AND is_deleted = FALSE AND date >= $1 AND date <= $2
            GROUP BY month
            "#,
        )
        .bind(since)
        .bind(today)
        .fetch_all(self.get_pool())
        .await?;

        let totals: HashMap<String, i64> = rows.into_iter().collect();
        Ok(revenue_series(today, &totals))
    }

    pub async fn fetch_latest_invoices(&self) -> Result<Vec<LatestInvoice>> {
        let invoices = sqlx::query_as::<_, LatestInvoice>(
            r#"
            SELECT i.id, i.date, i.status, i.total_amount,
                p.name AS project_name, c.name AS customer_name, c.email AS customer_email
            FROM invoices i
            JOIN projects p ON p.id = i.project_id
            JOIN customers c ON c.id = p.customer_id
            WHERE i.is_deleted = FALSE
            ORDER BY i.date DESC, i.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_INVOICES)
        .fetch_all(self.get_pool())
        .await?;

        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn months_back_crosses_years() {
        assert_eq!(months_back(date(2024, 3, 17), 0), Some(date(2024, 3, 1)));
        assert_eq!(months_back(date(2024, 3, 17), 3), Some(date(2023, 12, 1)));
        assert_eq!(months_back(date(2024, 3, 17), 11), Some(date(2023, 4, 1)));
    }

    #[test]
    fn revenue_is_zero_filled_oldest_first() {
        let totals = HashMap::from([
            ("2023-06".to_string(), 150000),
            ("2024-02".to_string(), 42000),
            ("2022-01".to_string(), 99),
        ]);
        let series = revenue_series(date(2024, 2, 29), &totals);

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month, "2023-03");
        assert_eq!(series[11], MonthlyRevenue { month: "2024-02".into(), revenue: 42000 });
        assert_eq!(series[3].revenue, 150000);
        assert_eq!(series.iter().map(|m| m.revenue).sum::<i64>(), 192000);
    }
}
