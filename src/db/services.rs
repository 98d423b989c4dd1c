use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::error::Result;
use crate::forms::services::ServiceRef;
use crate::models::Service;

/// A service planned on a project.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectServiceRow {
    pub service_id: Uuid,
    pub name: String,
    pub quantity: f64,
    /// øre
    pub unit_price: i64,
}

impl Database {
    // Service catalogue
    pub async fn fetch_services(&self) -> Result<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>("SELECT id, name FROM services ORDER BY name ASC")
            .fetch_all(self.get_pool())
            .await?;

        Ok(services)
    }

    pub async fn fetch_services_by_project(&self, project_id: Uuid) -> Result<Vec<ProjectServiceRow>> {
        let services = sqlx::query_as::<_, ProjectServiceRow>(
            r#"
            SELECT ps.service_id, s.name, ps.quantity, ps.unit_price
            FROM project_services ps
            JOIN services s ON s.id = ps.service_id
            WHERE ps.project_id = $1
            ORDER BY s.name ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(services)
    }
}

/// Resolve a submitted line to a catalogue id: the id itself, an existing
/// service with the same name, or a newly created one.
pub(crate) async fn resolve_service(conn: &mut PgConnection, service: &ServiceRef) -> sqlx::Result<Uuid> {
    match service {
        ServiceRef::Id(id) => Ok(*id),
        ServiceRef::Name(name) => {
            let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM services WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?;
            if let Some(id) = existing {
                return Ok(id);
            }

            // ON CONFLICT covers a concurrent insert of the same name
            let id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO services (id, name) VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
            tracing::debug!("created service {} ({})", name, id);
            Ok(id)
        }
    }
}
