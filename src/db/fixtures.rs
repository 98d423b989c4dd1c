//! Rows for database tests, created through the regular write paths.

use chrono::NaiveDate;
use uuid::Uuid;

use super::Database;
use crate::forms::address::AddressForm;
use crate::forms::customer::CustomerForm;
use crate::forms::project::ProjectForm;
use crate::forms::services::{ServiceLine, ServiceRef};
use crate::forms::worker::WorkerForm;
use crate::models::{Customer, CustomerKind, Project, ProjectStatus, Worker};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn address() -> AddressForm {
    AddressForm {
        street: "Vesterbrogade 41".into(),
        postal_code: "1620".into(),
        city: "København V".into(),
    }
}

pub async fn customer(db: &Database, name: &str) -> Customer {
    db.create_customer(
        &CustomerForm {
            name: name.into(),
            email: format!("{}@example.dk", name.to_lowercase()),
            phone: "20 30 40 50".into(),
            kind: CustomerKind::Private,
            cvr_number: None,
        },
        &address(),
    )
    .await
    .unwrap()
}

pub async fn worker(db: &Database, name: &str) -> Worker {
    db.create_worker(
        &WorkerForm {
            name: name.into(),
            email: format!("{}@rahmaler.dk", name.to_lowercase()),
            phone: "40 50 60 70".into(),
            position: "Malersvend".into(),
            daily_rate: 180000,
            start_date: date(2024, 1, 1),
            is_active: true,
        },
        &address(),
    )
    .await
    .unwrap()
}

pub async fn project(
    db: &Database,
    customer_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    worker_ids: &[Uuid],
) -> Project {
    db.create_project(&ProjectForm {
        name: "Opgang".into(),
        customer_id,
        status: ProjectStatus::Active,
        start_date: start,
        end_date: Some(end),
        address: address(),
        services: vec![ServiceLine {
            service: ServiceRef::Name("Vægmaling".into()),
            quantity: 40.0,
            amount: 95.0,
        }],
        worker_ids: worker_ids.to_vec(),
    })
    .await
    .unwrap()
}
