use serde::Serialize;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}
