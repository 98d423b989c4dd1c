mod customers;
mod dashboard;
#[cfg(test)]
mod fixtures;
mod invoices;
mod payments;
mod projects;
mod seed;
mod services;
mod vacations;
mod work_entries;
mod workers;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::forms::address::AddressForm;
use crate::models::Address;

pub use customers::{CustomerDetail, CustomerOption, CustomerTableRow};
pub use dashboard::{CardData, LatestInvoice, MonthlyRevenue};
pub use invoices::{InvoiceDetail, InvoiceLineRow, InvoiceTableRow};
pub use payments::{PaymentRow, PendingPayment};
pub use projects::{ProjectDetail, ProjectOption, ProjectTableRow, WorkerShort};
pub use seed::SeedReport;
pub use services::ProjectServiceRow;
pub use work_entries::{MonthlyLogs, WorkLogRow, WorkLogSummary, WorkerHistory};
pub use workers::{WorkerDetail, WorkerTableRow};

/// Rows per page in every paginated table
pub const ITEMS_PER_PAGE: i64 = 6;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> crate::error::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Row offset for a 1-based page number.
pub fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1) * ITEMS_PER_PAGE
}

pub fn total_pages(count: i64) -> i64 {
    (count + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE
}

/// `%query%` for ILIKE, with the pattern characters of the query escaped.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// Address helpers shared by customers, projects and workers

pub(crate) async fn insert_address(
    conn: &mut PgConnection,
    address: &AddressForm,
) -> sqlx::Result<Uuid> {
    sqlx::query_scalar(
        "INSERT INTO addresses (id, street, postal_code, city) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(&address.street)
    .bind(&address.postal_code)
    .bind(&address.city)
    .fetch_one(conn)
    .await
}

/// Update the linked address, or create one when the owner has none.
pub(crate) async fn upsert_address(
    conn: &mut PgConnection,
    existing: Option<Uuid>,
    address: &AddressForm,
) -> sqlx::Result<Uuid> {
    match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE addresses SET street = $1, postal_code = $2, city = $3 WHERE id = $4",
            )
            .bind(&address.street)
            .bind(&address.postal_code)
            .bind(&address.city)
            .bind(id)
            .execute(conn)
            .await?;
            Ok(id)
        }
        None => insert_address(conn, address).await,
    }
}

pub(crate) async fn fetch_address(
    pool: &PgPool,
    id: Option<Uuid>,
) -> sqlx::Result<Option<Address>> {
    let Some(id) = id else {
        return Ok(None);
    };
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    tracing::info!(
        "connected to database (max {} connections)",
        config.database_max_connections
    );

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(6), 1);
        assert_eq!(total_pages(7), 2);
        assert_eq!(total_pages(13), 3);
    }

    #[test]
    fn offsets_are_one_based() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(3), 12);
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(-4), 0);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" maler "), "%maler%");
        assert_eq!(contains_pattern("100%_"), "%100\\%\\_%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
