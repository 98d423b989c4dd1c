//! Demo data for a fresh database.

use chrono::{Days, NaiveDate};

use super::Database;
use crate::error::Result;
use crate::forms::address::AddressForm;
use crate::forms::customer::CustomerForm;
use crate::forms::invoice::InvoiceForm;
use crate::forms::payment::PaymentForm;
use crate::forms::project::ProjectForm;
use crate::forms::services::{ServiceLine, ServiceRef};
use crate::forms::vacation::VacationForm;
use crate::forms::work_log::WorkLogForm;
use crate::forms::worker::WorkerForm;
use crate::models::{CustomerKind, InvoiceStatus, PaymentStatus, ProjectStatus};
use crate::work_log::SubmittedDay;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub customers: usize,
    pub workers: usize,
    pub projects: usize,
    pub invoices: usize,
    pub work_entries: usize,
}

fn address(street: &str, postal_code: &str, city: &str) -> AddressForm {
    AddressForm {
        street: street.into(),
        postal_code: postal_code.into(),
        city: city.into(),
    }
}

fn line(name: &str, quantity: f64, amount: f64) -> ServiceLine {
    ServiceLine {
        service: ServiceRef::Name(name.into()),
        quantity,
        amount,
    }
}

fn days_from(start: NaiveDate, count: u64) -> Vec<SubmittedDay> {
    (0..count)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .map(|date| SubmittedDay {
            date,
            is_full_day: true,
            note: None,
            worked: true,
        })
        .collect()
}

impl Database {
    /// Insert a small demo data set. Does nothing when customers exist.
    pub async fn seed(&self, today: NaiveDate) -> Result<SeedReport> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(self.get_pool())
            .await?;
        if existing > 0 {
            tracing::warn!("database already holds {} customer(s), skipping seed", existing);
            return Ok(SeedReport::default());
        }

        let mut report = SeedReport::default();

        let private = self
            .create_customer(
                &CustomerForm {
                    name: "Jens Nielsen".into(),
                    email: "jens@example.dk".into(),
                    phone: "20 30 40 50".into(),
                    kind: CustomerKind::Private,
                    cvr_number: None,
                },
                &address("Frederiksberg Allé 12", "1820", "Frederiksberg C"),
            )
            .await?;
        let company = self
            .create_customer(
                &CustomerForm {
                    name: "Ejendomsselskabet Nordhavn ApS".into(),
                    email: "drift@nordhavn-ejendom.dk".into(),
                    phone: "33 44 55 66".into(),
                    kind: CustomerKind::Company,
                    cvr_number: Some("12345678".into()),
                },
                &address("Sandkaj 29", "2150", "Nordhavn"),
            )
            .await?;
        report.customers = 2;

        let start = today.checked_sub_days(Days::new(30)).unwrap_or(today);
        let mut worker_ids = Vec::new();
        for (name, email, position, rate) in [
            ("Mikkel Sørensen", "mikkel@example.dk", "Malersvend", 180000),
            ("Sara Holm", "sara@example.dk", "Lærling", 95000),
        ] {
            let worker = self
                .create_worker(
                    &WorkerForm {
                        name: name.into(),
                        email: email.into(),
                        phone: "40 50 60 70".into(),
                        position: position.into(),
                        daily_rate: rate,
                        start_date: start,
                        is_active: true,
                    },
                    &address("Nørrebrogade 100", "2200", "København N"),
                )
                .await?;
            worker_ids.push(worker.id);
        }
        report.workers = worker_ids.len();

        let end = today.checked_add_days(Days::new(14)).unwrap_or(today);
        let facade = self
            .create_project(&ProjectForm {
                name: "Facaderenovering".into(),
                customer_id: company.id,
                status: ProjectStatus::Active,
                start_date: start,
                end_date: Some(end),
                address: address("Sandkaj 29", "2150", "Nordhavn"),
                services: vec![line("Facademaling", 120.0, 185.0), line("Stillads", 1.0, 12500.0)],
                worker_ids: worker_ids.clone(),
            })
            .await?;
        let apartment = self
            .create_project(&ProjectForm {
                name: "Lejlighed, stue og køkken".into(),
                customer_id: private.id,
                status: ProjectStatus::Completed,
                start_date: start,
                end_date: Some(start.checked_add_days(Days::new(6)).unwrap_or(start)),
                address: address("Frederiksberg Allé 12", "1820", "Frederiksberg C"),
                services: vec![line("Vægmaling", 65.0, 95.0), line("Loftmaling", 30.0, 110.0)],
                worker_ids: worker_ids[..1].to_vec(),
            })
            .await?;
        report.projects = 2;

        self.create_invoice(
            &InvoiceForm {
                project_id: apartment.id,
                status: InvoiceStatus::Paid,
                services: vec![line("Vægmaling", 65.0, 95.0), line("Loftmaling", 30.0, 110.0)],
            },
            today,
        )
        .await?;
        self.create_invoice(
            &InvoiceForm {
                project_id: facade.id,
                status: InvoiceStatus::Pending,
                services: vec![line("Stillads", 1.0, 12500.0)],
            },
            today,
        )
        .await?;
        report.invoices = 2;

        for worker_id in &worker_ids {
            let plan = self
                .save_work_log(&WorkLogForm {
                    worker_id: *worker_id,
                    project_id: facade.id,
                    days: days_from(start, 10),
                })
                .await?;
            report.work_entries += plan.upserts.len();
        }

        self.save_payment(&PaymentForm {
            id: None,
            worker_id: worker_ids[0],
            amount: 900000,
            date: today,
            status: PaymentStatus::Pending,
            notes: Some("Acontoløn".into()),
        })
        .await?;
        self.save_vacation(&VacationForm {
            id: None,
            worker_id: worker_ids[1],
            start_date: end,
            end_date: end.checked_add_days(Days::new(4)).unwrap_or(end),
            approved: true,
            reason: Some("Sommerferie".into()),
        })
        .await?;

        tracing::info!("seeded demo data: {:?}", report);
        Ok(report)
    }
}
