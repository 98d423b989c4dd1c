use serde::Serialize;
use uuid::Uuid;

use super::{contains_pattern, fetch_address, insert_address, page_offset, total_pages, upsert_address, Database, ITEMS_PER_PAGE};
use crate::error::{AppError, Result};
use crate::forms::address::AddressForm;
use crate::forms::customer::CustomerForm;
use crate::models::{Address, Customer, CustomerKind};
use crate::money::format_currency;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub address: Option<Address>,
}

#[derive(sqlx::FromRow)]
struct CustomerTotals {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    kind: CustomerKind,
    total_invoices: i64,
    total_pending: i64,
    total_paid: i64,
}

/// A row of the customers table, with amounts formatted for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTableRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: CustomerKind,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

impl From<CustomerTotals> for CustomerTableRow {
    fn from(row: CustomerTotals) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            kind: row.kind,
            total_invoices: row.total_invoices,
            total_pending: format_currency(row.total_pending),
            total_paid: format_currency(row.total_paid),
        }
    }
}

impl Database {
    // Customer operations
    pub async fn create_customer(&self, form: &CustomerForm, address: &AddressForm) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;

        let address_id = insert_address(&mut *tx, address).await?;
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, email, phone, kind, cvr_number, address_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(form.kind)
        .bind(&form.cvr_number)
        .bind(address_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("created customer {} ({})", customer.name, customer.id);
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        id: Uuid,
        form: &CustomerForm,
        address: &AddressForm,
    ) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $1, email = $2, phone = $3, kind = $4, cvr_number = $5, updated_at = NOW()
            WHERE id = $6 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(form.kind)
        .bind(&form.cvr_number)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

        let address_id = upsert_address(&mut *tx, customer.address_id, address).await?;
        let customer = if customer.address_id != Some(address_id) {
            sqlx::query_as::<_, Customer>(
                "UPDATE customers SET address_id = $1 WHERE id = $2 RETURNING *",
            )
            .bind(address_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            customer
        };

        tx.commit().await?;
        Ok(customer)
    }

    pub async fn fetch_customer_by_id(&self, id: Uuid) -> Result<CustomerDetail> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

        let address = fetch_address(self.get_pool(), customer.address_id).await?;
        Ok(CustomerDetail { customer, address })
    }

    /// Customers for select boxes
    pub async fn load_customers(&self) -> Result<Vec<CustomerOption>> {
        let customers = sqlx::query_as::<_, CustomerOption>(
            "SELECT id, name FROM customers WHERE is_deleted = FALSE ORDER BY name ASC",
        )
        .fetch_all(self.get_pool())
        .await?;

        Ok(customers)
    }

    pub async fn fetch_filtered_customers(&self, query: &str, page: i64) -> Result<Vec<CustomerTableRow>> {
        let rows = sqlx::query_as::<_, CustomerTotals>(
            r#"
            SELECT c.id, c.name, c.email, c.phone, c.kind,
                COUNT(i.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN i.status = 'pending' THEN i.total_amount ELSE 0 END), 0)::BIGINT AS total_pending,
                COALESCE(SUM(CASE WHEN i.status = 'paid' THEN i.total_amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM customers c
            LEFT JOIN projects p ON p.customer_id = c.id
            LEFT JOIN invoices i ON i.project_id = p.id AND i.is_deleted = FALSE
            WHERE c.is_deleted = FALSE
                AND (c.name ILIKE $1 OR c.email ILIKE $1)
            GROUP BY c.id
            ORDER BY c.name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(contains_pattern(query))
        .bind(ITEMS_PER_PAGE)
        .bind(page_offset(page))
        .fetch_all(self.get_pool())
        .await?;

        Ok(rows.into_iter().map(CustomerTableRow::from).collect())
    }

    pub async fn fetch_customers_pages(&self, query: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE is_deleted = FALSE AND (name ILIKE $1 OR email ILIKE $1)
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_one(self.get_pool())
        .await?;

        Ok(total_pages(count))
    }

    /// Soft delete a customer and cancel all of its projects
    pub async fn delete_customer(&self, id: Uuid) -> Result<()> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE customers SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer"));
        }

        let cancelled = sqlx::query(
            r#"
            UPDATE projects
            SET is_deleted = TRUE, status = 'cancelled', updated_at = NOW()
            WHERE customer_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            "deleted customer {} and cancelled {} project(s)",
            id,
            cancelled.rows_affected()
        );
        Ok(())
    }
}
