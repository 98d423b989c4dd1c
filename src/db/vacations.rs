use chrono::NaiveDate;
use uuid::Uuid;

use super::Database;
use crate::error::{AppError, Result};
use crate::forms::vacation::VacationForm;
use crate::models::Vacation;
use crate::salary::year_bounds;

impl Database {
    // Vacation operations
    pub async fn save_vacation(&self, form: &VacationForm) -> Result<Vacation> {
        let vacation = match form.id {
            Some(id) => sqlx::query_as::<_, Vacation>(
                r#"
                UPDATE vacations
                SET start_date = $1, end_date = $2, approved = $3, reason = $4
                WHERE id = $5
                RETURNING *
                "#,
            )
            .bind(form.start_date)
            .bind(form.end_date)
            .bind(form.approved)
            .bind(&form.reason)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(AppError::NotFound("Vacation"))?,
            None => {
                sqlx::query_as::<_, Vacation>(
                    r#"
                    INSERT INTO vacations (id, worker_id, start_date, end_date, approved, reason)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(form.worker_id)
                .bind(form.start_date)
                .bind(form.end_date)
                .bind(form.approved)
                .bind(&form.reason)
                .fetch_one(self.get_pool())
                .await?
            }
        };

        tracing::info!("saved vacation {} for worker {}", vacation.id, vacation.worker_id);
        Ok(vacation)
    }

    pub async fn fetch_vacations_by_worker(&self, worker_id: Uuid) -> Result<Vec<Vacation>> {
        let vacations = sqlx::query_as::<_, Vacation>(
            "SELECT * FROM vacations WHERE worker_id = $1 ORDER BY start_date DESC",
        )
        .bind(worker_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(vacations)
    }

    /// Vacations starting or ending within the year
    pub async fn fetch_vacations_by_year(&self, worker_id: Uuid, year: i32) -> Result<Vec<Vacation>> {
        let (start, next) = year_bounds(year).ok_or(AppError::validation("year", "Invalid year."))?;
        let vacations = sqlx::query_as::<_, Vacation>(
            r#"
            SELECT * FROM vacations
            WHERE worker_id = $1
                AND ((start_date >= $2 AND start_date < $3) OR (end_date >= $2 AND end_date < $3))
            ORDER BY start_date ASC
            "#,
        )
        .bind(worker_id)
        .bind(start)
        .bind(next)
        .fetch_all(self.get_pool())
        .await?;

        Ok(vacations)
    }

    /// Vacations sharing at least one day with `[from, to]`
    pub(crate) async fn vacations_overlapping(
        &self,
        worker_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Vacation>> {
        let vacations = sqlx::query_as::<_, Vacation>(
            r#"
            SELECT * FROM vacations
            WHERE worker_id = $1 AND start_date <= $3 AND end_date >= $2
            ORDER BY start_date ASC
            "#,
        )
        .bind(worker_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.get_pool())
        .await?;

        Ok(vacations)
    }

    pub async fn delete_vacation(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM vacations WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Vacation"));
        }
        Ok(())
    }
}
