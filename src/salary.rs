//! Month-by-month wage accounting for a worker.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Payment, PaymentStatus};
use crate::money;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of a 1-based month.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// First and last day of a 1-based month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = next_month_start(first)?;
    Some((first, next.pred_opt()?))
}

/// First day of the month after `date`'s month.
pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// `[Jan 1, Jan 1 next year)`
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    pub id: Uuid,
    pub amount: i64,
    pub date: NaiveDate,
    pub status: PaymentStatus,
    pub note: Option<String>,
}

impl From<&Payment> for PaymentLine {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            date: payment.date,
            status: payment.status,
            note: payment.notes.clone(),
        }
    }
}

/// Wage position for one month. Amounts in øre.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: String,
    pub days_worked: i64,
    pub daily_rate: i64,
    pub payable: i64,
    pub total_paid: i64,
    pub outstanding: i64,
    pub payments: Vec<PaymentLine>,
}

pub fn summarize_month(
    month: u32,
    daily_rate: i64,
    days_worked: i64,
    payments: &[&Payment],
) -> MonthSummary {
    let payable = daily_rate.saturating_mul(days_worked);
    let total_paid = money::sum(payments.iter().map(|p| p.amount));

    let mut lines: Vec<PaymentLine> = payments.iter().map(|p| PaymentLine::from(*p)).collect();
    lines.sort_by_key(|line| line.date);

    MonthSummary {
        month: month_name(month).unwrap_or_default().to_string(),
        days_worked,
        daily_rate,
        payable,
        total_paid,
        outstanding: payable.saturating_sub(total_paid),
        payments: lines,
    }
}

/// Twelve month summaries. `entry_dates` has one element per work entry
/// in the year, so a day logged on two projects counts twice.
pub fn summarize_year(
    year: i32,
    daily_rate: i64,
    entry_dates: &[NaiveDate],
    payments: &[Payment],
) -> Vec<MonthSummary> {
    (1..=12)
        .map(|month| {
            let days_worked = entry_dates
                .iter()
                .filter(|d| d.year() == year && d.month() == month)
                .count() as i64;
            let in_month: Vec<&Payment> = payments
                .iter()
                .filter(|p| p.date.year() == year && p.date.month() == month)
                .collect();
            summarize_month(month, daily_rate, days_worked, &in_month)
        })
        .collect()
}

/// Distinct worked dates per month, keyed by 0-based month index.
pub fn worked_days_per_month(dates: &[NaiveDate]) -> BTreeMap<u32, u32> {
    let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let mut per_month = BTreeMap::new();
    for date in unique {
        *per_month.entry(date.month0()).or_insert(0) += 1;
    }
    per_month
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(amount: i64, on: NaiveDate) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            worker_id: Uuid::nil(),
            amount,
            date: on,
            status: PaymentStatus::Paid,
            notes: None,
        }
    }

    #[test]
    fn month_names_and_bounds() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);

        assert_eq!(month_bounds(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_bounds(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_bounds(2024, 13), None);
    }

    #[test]
    fn month_summary_arithmetic() {
        let a = payment(500000, date(2024, 3, 20));
        let b = payment(250000, date(2024, 3, 5));
        let summary = summarize_month(3, 150000, 6, &[&a, &b]);

        assert_eq!(summary.month, "March");
        assert_eq!(summary.payable, 900000);
        assert_eq!(summary.total_paid, 750000);
        assert_eq!(summary.outstanding, 150000);
        assert_eq!(summary.payments[0].date, date(2024, 3, 5));
    }

    #[test]
    fn overpaid_month_goes_negative() {
        let a = payment(200000, date(2024, 1, 31));
        let summary = summarize_month(1, 150000, 1, &[&a]);
        assert_eq!(summary.outstanding, -50000);
    }

    #[test]
    fn extreme_rate_saturates() {
        let summary = summarize_month(1, i64::MAX, 2, &[]);
        assert_eq!(summary.payable, i64::MAX);
        assert_eq!(summary.outstanding, i64::MAX);

        let a = payment(i64::MAX, date(2024, 1, 5));
        let b = payment(i64::MAX, date(2024, 1, 6));
        let summary = summarize_month(1, 0, 0, &[&a, &b]);
        assert_eq!(summary.total_paid, i64::MAX);
        assert_eq!(summary.outstanding, -i64::MAX);
    }

    #[test]
    fn year_summary_buckets_by_month() {
        let entries = [
            date(2024, 1, 2),
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 4, 15),
            date(2023, 4, 15),
        ];
        let payments = [payment(100, date(2024, 4, 30)), payment(999, date(2025, 4, 1))];
        let year = summarize_year(2024, 1000, &entries, &payments);

        assert_eq!(year.len(), 12);
        assert_eq!(year[0].days_worked, 3);
        assert_eq!(year[0].payable, 3000);
        assert_eq!(year[3].days_worked, 1);
        assert_eq!(year[3].total_paid, 100);
        assert_eq!(year[3].outstanding, 900);
        assert_eq!(year[11].month, "December");
        assert_eq!(year[11].payable, 0);
    }

    #[test]
    fn worked_days_count_unique_dates() {
        let per_month = worked_days_per_month(&[
            date(2024, 1, 2),
            date(2024, 1, 2),
            date(2024, 1, 9),
            date(2024, 12, 31),
        ]);
        assert_eq!(per_month.get(&0), Some(&2));
        assert_eq!(per_month.get(&11), Some(&1));
        assert_eq!(per_month.get(&5), None);
    }
}
