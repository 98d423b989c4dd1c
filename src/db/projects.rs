use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use super::services::{resolve_service, ProjectServiceRow};
use super::{contains_pattern, insert_address, page_offset, total_pages, upsert_address, Database, ITEMS_PER_PAGE};
use crate::error::{AppError, Result};
use crate::forms::address::AddressForm;
use crate::forms::project::ProjectForm;
use crate::models::{Address, Project, ProjectStatus};
use crate::money::{format_currency, to_minor};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkerShort {
    pub id: Uuid,
    pub name: String,
}

/// Projects for the work-log selector
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOption {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub customer: ProjectCustomer,
    pub workers: Vec<WorkerShort>,
    pub services: Vec<ProjectServiceRow>,
    /// Blank fields when the project has no address
    pub address: AddressForm,
}

#[derive(sqlx::FromRow)]
struct ProjectTotals {
    id: Uuid,
    name: String,
    status: ProjectStatus,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    planned_price: Option<i64>,
    customer_id: Uuid,
    customer_name: String,
    total_invoices: i64,
    total_pending: i64,
    total_paid: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTableRow {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Formatted, or empty when no price was planned
    pub planned_price: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

impl From<ProjectTotals> for ProjectTableRow {
    fn from(row: ProjectTotals) -> Self {
        Self {
            id: row.id,
            name: row.name,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
            planned_price: row
                .planned_price
                .filter(|price| *price != 0)
                .map(format_currency)
                .unwrap_or_default(),
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            total_invoices: row.total_invoices,
            total_pending: format_currency(row.total_pending),
            total_paid: format_currency(row.total_paid),
        }
    }
}

const PROJECT_FILTER: &str = r#"
    p.is_deleted = FALSE
    AND (p.name ILIKE $1 OR c.name ILIKE $1 OR p.status::TEXT ILIKE $1)
"#;

/// Insert the planned lines of a project, resolving services by name.
async fn insert_project_services(
    conn: &mut PgConnection,
    project_id: Uuid,
    form: &ProjectForm,
) -> sqlx::Result<()> {
    for line in &form.services {
        let service_id = resolve_service(&mut *conn, &line.service).await?;
        sqlx::query(
            r#"
            INSERT INTO project_services (id, project_id, service_id, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(service_id)
        .bind(to_minor(line.amount))
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_assignments(
    conn: &mut PgConnection,
    project_id: Uuid,
    worker_ids: &[Uuid],
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> sqlx::Result<()> {
    for worker_id in worker_ids {
        sqlx::query(
            r#"
            INSERT INTO project_assignments (id, project_id, worker_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(worker_id)
        .bind(start_date)
        .bind(end_date)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl Database {
    // Project operations
    pub async fn create_project(&self, form: &ProjectForm) -> Result<Project> {
        let mut tx = self.pool.begin().await?;

        let address_id = insert_address(&mut *tx, &form.address).await?;
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, customer_id, name, status, start_date, end_date, planned_price, address_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(form.customer_id)
        .bind(&form.name)
        .bind(form.status)
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(form.planned_price())
        .bind(address_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_project_services(&mut *tx, project.id, form).await?;
        // New assignments are open-ended
        insert_assignments(&mut *tx, project.id, &form.worker_ids, form.start_date, None).await?;

        tx.commit().await?;
        tracing::info!("created project {} ({})", project.name, project.id);
        Ok(project)
    }

    pub async fn update_project(&self, id: Uuid, form: &ProjectForm) -> Result<Project> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Option<Uuid>> = sqlx::query_scalar(
            "SELECT address_id FROM projects WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let existing_address = existing.ok_or(AppError::NotFound("Project"))?;

        let address_id = upsert_address(&mut *tx, existing_address, &form.address).await?;
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET customer_id = $1, name = $2, status = $3, start_date = $4, end_date = $5,
                planned_price = $6, address_id = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(form.customer_id)
        .bind(&form.name)
        .bind(form.status)
        .bind(form.start_date)
        .bind(form.end_date)
        .bind(form.planned_price())
        .bind(address_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        // Services and assignments are replaced wholesale
        sqlx::query("DELETE FROM project_services WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_project_services(&mut *tx, id, form).await?;

        sqlx::query("DELETE FROM project_assignments WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_assignments(&mut *tx, id, &form.worker_ids, form.start_date, form.end_date).await?;

        tx.commit().await?;
        Ok(project)
    }

    pub async fn fetch_project_by_id(&self, id: Uuid) -> Result<ProjectDetail> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?
        .ok_or(AppError::NotFound("Project"))?;

        let customer = sqlx::query_as::<_, ProjectCustomer>(
            "SELECT id, name, email, phone FROM customers WHERE id = $1",
        )
        .bind(project.customer_id)
        .fetch_one(self.get_pool())
        .await?;

        let workers = sqlx::query_as::<_, WorkerShort>(
            r#"
            SELECT DISTINCT w.id, w.name
            FROM project_assignments a
            JOIN workers w ON w.id = a.worker_id
            WHERE a.project_id = $1
            ORDER BY w.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.get_pool())
        .await?;

        let services = self.fetch_services_by_project(id).await?;

        let address = super::fetch_address(self.get_pool(), project.address_id)
            .await?
            .map(|Address { street, postal_code, city, .. }| AddressForm {
                street,
                postal_code,
                city,
            })
            .unwrap_or_else(|| AddressForm {
                street: String::new(),
                postal_code: String::new(),
                city: String::new(),
            });

        Ok(ProjectDetail {
            project,
            customer,
            workers,
            services,
            address,
        })
    }

    pub async fn fetch_filtered_projects(&self, query: &str, page: i64) -> Result<Vec<ProjectTableRow>> {
        let sql = format!(
            r#"
            SELECT p.id, p.name, p.status, p.start_date, p.end_date, p.planned_price,
                c.id AS customer_id, c.name AS customer_name,
                COUNT(i.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN i.status = 'pending' THEN i.total_amount ELSE 0 END), 0)::BIGINT AS total_pending,
                COALESCE(SUM(CASE WHEN i.status = 'paid' THEN i.total_amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM projects p
            JOIN customers c ON c.id = p.customer_id
            LEFT JOIN invoices i ON i.project_id = p.id AND i.is_deleted = FALSE
            WHERE {PROJECT_FILTER}
            GROUP BY p.id, c.id
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, ProjectTotals>(&sql)
            .bind(contains_pattern(query))
            .bind(ITEMS_PER_PAGE)
            .bind(page_offset(page))
            .fetch_all(self.get_pool())
            .await?;

        Ok(rows.into_iter().map(ProjectTableRow::from).collect())
    }

    pub async fn fetch_projects_pages(&self, query: &str) -> Result<i64> {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM projects p
            JOIN customers c ON c.id = p.customer_id
            WHERE {PROJECT_FILTER}
            "#
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(contains_pattern(query))
            .fetch_one(self.get_pool())
            .await?;

        Ok(total_pages(count))
    }

    pub async fn load_projects(&self) -> Result<Vec<ProjectOption>> {
        let projects = sqlx::query_as::<_, ProjectOption>(
            "SELECT id, name, start_date, end_date FROM projects WHERE is_deleted = FALSE ORDER BY name ASC",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(projects)
    }

    /// Active workers assigned to a project, once each
    pub async fn fetch_workers_assigned_to_project(&self, project_id: Uuid) -> Result<Vec<WorkerShort>> {
        let workers = sqlx::query_as::<_, WorkerShort>(
            r#"
            SELECT DISTINCT w.id, w.name
            FROM project_assignments a
            JOIN workers w ON w.id = a.worker_id
            WHERE a.project_id = $1 AND w.is_active = TRUE AND w.is_deleted = FALSE
            ORDER BY w.name ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(workers)
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query(
            "UPDATE projects SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(self.get_pool())
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Project"));
        }
        tracing::info!("deleted project {}", id);
        Ok(())
    }
}
