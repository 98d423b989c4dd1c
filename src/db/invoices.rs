use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use super::services::resolve_service;
use super::{contains_pattern, fetch_address, page_offset, total_pages, Database, ITEMS_PER_PAGE};
use crate::error::{AppError, Result};
use crate::forms::invoice::InvoiceForm;
use crate::forms::parse_number;
use crate::invoice_gen::{InvoiceDocument, InvoiceLine};
use crate::models::{Address, Invoice, InvoiceStatus};
use crate::money::{format_currency, to_minor};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTableRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: InvoiceStatus,
    pub total_amount: i64,
    pub project_id: Uuid,
    pub project_name: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
}

/// One billed service line of an invoice.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub quantity: f64,
    /// Unit price in øre
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: InvoiceTableRow,
    pub total_formatted: String,
    pub project_address: Option<Address>,
    pub customer_address: Option<Address>,
    pub services: Vec<InvoiceLineRow>,
}

impl InvoiceDetail {
    /// The printable document. Billing goes to the customer's address.
    pub fn document(&self) -> InvoiceDocument {
        let address = self.customer_address.as_ref().or(self.project_address.as_ref());
        InvoiceDocument {
            invoice_id: self.invoice.id,
            customer_name: self.invoice.customer_name.clone(),
            customer_email: self.invoice.customer_email.clone(),
            street: address.map(|a| a.street.clone()).unwrap_or_default(),
            postal_code: address.map(|a| a.postal_code.clone()).unwrap_or_default(),
            city: address.map(|a| a.city.clone()).unwrap_or_default(),
            lines: self
                .services
                .iter()
                .map(|line| InvoiceLine {
                    service_name: line.name.clone(),
                    quantity: line.quantity,
                    amount: line.amount,
                })
                .collect(),
        }
    }
}

/// How a free-text search narrows the invoice table.
#[derive(Debug, Clone, PartialEq)]
struct InvoiceSearch {
    pattern: String,
    status: Option<InvoiceStatus>,
    total_amount: Option<i64>,
}

impl InvoiceSearch {
    fn new(query: &str) -> Self {
        let terms = query.trim().to_lowercase();
        let status = match terms.as_str() {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        };
        let total_amount = parse_number(&terms)
            .filter(|amount| *amount > 0.0)
            .map(to_minor);

        Self {
            pattern: contains_pattern(&terms),
            status,
            total_amount,
        }
    }
}

const INVOICE_FROM: &str = r#"
    FROM invoices i
    JOIN projects p ON p.id = i.project_id
    JOIN customers c ON c.id = p.customer_id
    WHERE i.is_deleted = FALSE
        AND (
            p.name ILIKE $1 OR c.name ILIKE $1 OR c.email ILIKE $1
            OR i.status = $2
            OR i.total_amount = $3
        )
"#;

const INVOICE_COLUMNS: &str = r#"
    i.id, i.date, i.status, i.total_amount,
    p.id AS project_id, p.name AS project_name,
    c.id AS customer_id, c.name AS customer_name, c.email AS customer_email
"#;

async fn insert_invoice_services(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    form: &InvoiceForm,
) -> sqlx::Result<()> {
    for line in &form.services {
        let service_id = resolve_service(&mut *conn, &line.service).await?;
        sqlx::query(
            r#"
            INSERT INTO invoice_services (id, invoice_id, service_id, amount, quantity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(service_id)
        .bind(to_minor(line.amount))
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl Database {
    // Invoice operations
    pub async fn create_invoice(&self, form: &InvoiceForm, today: NaiveDate) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (id, project_id, date, status, total_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(form.project_id)
        .bind(today)
        .bind(form.status)
        .bind(form.total_amount())
        .fetch_one(&mut *tx)
        .await?;

        insert_invoice_services(&mut *tx, invoice.id, form).await?;

        tx.commit().await?;
        tracing::info!("created invoice {} for project {}", invoice.id, invoice.project_id);
        Ok(invoice)
    }

    pub async fn update_invoice(&self, id: Uuid, form: &InvoiceForm) -> Result<Invoice> {
        let mut tx = self.pool.begin().await?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET project_id = $1, status = $2, total_amount = $3
            WHERE id = $4 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(form.project_id)
        .bind(form.status)
        .bind(form.total_amount())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;

        // Delete existing lines, then re-insert the submitted ones
        sqlx::query("DELETE FROM invoice_services WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_invoice_services(&mut *tx, id, form).await?;

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn fetch_invoice_by_id(&self, id: Uuid) -> Result<InvoiceDetail> {
        let sql = format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices i
            JOIN projects p ON p.id = i.project_id
            JOIN customers c ON c.id = p.customer_id
            WHERE i.id = $1 AND i.is_deleted = FALSE
            "#
        );
        let invoice = sqlx::query_as::<_, InvoiceTableRow>(&sql)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(AppError::NotFound("Invoice"))?;

        let (project_address_id, customer_address_id): (Option<Uuid>, Option<Uuid>) = sqlx::query_as(
            r#"
            SELECT p.address_id, c.address_id
            FROM projects p
            JOIN customers c ON c.id = p.customer_id
            WHERE p.id = $1
            "#,
        )
        .bind(invoice.project_id)
        .fetch_one(self.get_pool())
        .await?;

        let services = sqlx::query_as::<_, InvoiceLineRow>(
            r#"
            SELECT l.id, l.service_id, s.name, l.quantity, l.amount
            FROM invoice_services l
            JOIN services s ON s.id = l.service_id
            WHERE l.invoice_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(InvoiceDetail {
            total_formatted: format_currency(invoice.total_amount),
            project_address: fetch_address(self.get_pool(), project_address_id).await?,
            customer_address: fetch_address(self.get_pool(), customer_address_id).await?,
            invoice,
            services,
        })
    }

    pub async fn fetch_filtered_invoices(&self, query: &str, page: i64) -> Result<Vec<InvoiceTableRow>> {
        let search = InvoiceSearch::new(query);
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} {INVOICE_FROM} ORDER BY i.date DESC, i.created_at DESC LIMIT $4 OFFSET $5"
        );
        let invoices = sqlx::query_as::<_, InvoiceTableRow>(&sql)
            .bind(&search.pattern)
            .bind(search.status)
            .bind(search.total_amount)
            .bind(ITEMS_PER_PAGE)
            .bind(page_offset(page))
            .fetch_all(self.get_pool())
            .await?;

        Ok(invoices)
    }

    pub async fn fetch_invoices_pages(&self, query: &str) -> Result<i64> {
        let search = InvoiceSearch::new(query);
        let sql = format!("SELECT COUNT(*) {INVOICE_FROM}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(&search.pattern)
            .bind(search.status)
            .bind(search.total_amount)
            .fetch_one(self.get_pool())
            .await?;

        Ok(total_pages(count))
    }

    pub async fn delete_invoice(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("UPDATE invoices SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice"));
        }
        tracing::info!("deleted invoice {}", id);
        Ok(())
    }
}
