use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::projects::WorkerShort;
use super::{contains_pattern, fetch_address, insert_address, page_offset, total_pages, upsert_address, Database, ITEMS_PER_PAGE};
use crate::error::{AppError, Result};
use crate::forms::address::AddressForm;
use crate::forms::worker::WorkerForm;
use crate::models::{Address, Worker};
use crate::money::format_currency;

#[derive(Debug, Clone, Serialize)]
pub struct WorkerDetail {
    #[serde(flatten)]
    pub worker: Worker,
    pub address: Option<Address>,
}

#[derive(sqlx::FromRow)]
struct WorkerListRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    position: String,
    daily_rate: i64,
    start_date: NaiveDate,
    is_active: bool,
    street: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerTableRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub daily_rate: i64,
    pub daily_rate_formatted: String,
    pub start_date: NaiveDate,
    pub is_active: bool,
    pub address: Option<AddressForm>,
}

impl From<WorkerListRow> for WorkerTableRow {
    fn from(row: WorkerListRow) -> Self {
        let address = match (row.street, row.postal_code, row.city) {
            (Some(street), Some(postal_code), Some(city)) => Some(AddressForm {
                street,
                postal_code,
                city,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            position: row.position,
            daily_rate: row.daily_rate,
            daily_rate_formatted: format_currency(row.daily_rate),
            start_date: row.start_date,
            is_active: row.is_active,
            address,
        }
    }
}

impl Database {
    // Worker operations
    pub async fn create_worker(&self, form: &WorkerForm, address: &AddressForm) -> Result<Worker> {
        let mut tx = self.pool.begin().await?;

        let address_id = insert_address(&mut *tx, address).await?;
        let worker = sqlx::query_as::<_, Worker>(
            r#"
            INSERT INTO workers (id, name, email, phone, position, daily_rate, start_date, is_active, address_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(&form.position)
        .bind(form.daily_rate)
        .bind(form.start_date)
        .bind(form.is_active)
        .bind(address_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("created worker {} ({})", worker.name, worker.id);
        Ok(worker)
    }

    pub async fn update_worker(&self, id: Uuid, form: &WorkerForm, address: &AddressForm) -> Result<Worker> {
        let mut tx = self.pool.begin().await?;

        let worker = sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET name = $1, email = $2, phone = $3, position = $4, daily_rate = $5,
                start_date = $6, is_active = $7, updated_at = NOW()
            WHERE id = $8 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(&form.position)
        .bind(form.daily_rate)
        .bind(form.start_date)
        .bind(form.is_active)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Worker"))?;

        let address_id = upsert_address(&mut *tx, worker.address_id, address).await?;
        let worker = if worker.address_id != Some(address_id) {
            sqlx::query_as::<_, Worker>("UPDATE workers SET address_id = $1 WHERE id = $2 RETURNING *")
                .bind(address_id)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
        } else {
            worker
        };

        tx.commit().await?;
        Ok(worker)
    }

    pub async fn fetch_worker_by_id(&self, id: Uuid) -> Result<WorkerDetail> {
        let worker = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE id = $1 AND is_deleted = FALSE")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(AppError::NotFound("Worker"))?;

        let address = fetch_address(self.get_pool(), worker.address_id).await?;
        Ok(WorkerDetail { worker, address })
    }

    pub async fn fetch_filtered_workers(&self, query: &str, page: i64) -> Result<Vec<WorkerTableRow>> {
        let rows = sqlx::query_as::<_, WorkerListRow>(
            r#"
            SELECT w.id, w.name, w.email, w.phone, w.position, w.daily_rate, w.start_date, w.is_active,
                a.street, a.postal_code, a.city
            FROM workers w
            LEFT JOIN addresses a ON a.id = w.address_id
            WHERE w.is_deleted = FALSE
                AND (w.name ILIKE $1 OR w.email ILIKE $1 OR w.position ILIKE $1)
            ORDER BY w.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(contains_pattern(query))
        .bind(ITEMS_PER_PAGE)
        .bind(page_offset(page))
        .fetch_all(self.get_pool())
        .await?;

        Ok(rows.into_iter().map(WorkerTableRow::from).collect())
    }

    pub async fn fetch_workers_pages(&self, query: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM workers
            WHERE is_deleted = FALSE AND (name ILIKE $1 OR email ILIKE $1 OR position ILIKE $1)
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_one(self.get_pool())
        .await?;

        Ok(total_pages(count))
    }

    /// Active workers for select boxes
    pub async fn load_workers(&self) -> Result<Vec<WorkerShort>> {
        let workers = sqlx::query_as::<_, WorkerShort>(
            "SELECT id, name FROM workers WHERE is_active = TRUE AND is_deleted = FALSE ORDER BY name ASC",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(workers)
    }

    pub async fn delete_worker(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query(
            "UPDATE workers SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(self.get_pool())
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Worker"));
        }
        tracing::info!("deleted worker {}", id);
        Ok(())
    }

    /// Daily rate of an existing worker, for salary calculations
    pub(crate) async fn worker_daily_rate(&self, id: Uuid) -> Result<i64> {
        let rate: Option<i64> = sqlx::query_scalar("SELECT daily_rate FROM workers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?;

        rate.ok_or(AppError::NotFound("Worker"))
    }
}
