use crate::{conflict_or_db, models::DbServiceType};
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use worship_core::errors::WorshipResult;

pub async fn list_service_types(pool: &Pool<Postgres>) -> Result<Vec<DbServiceType>> {
    let service_types = sqlx::query_as::<_, DbServiceType>(
        "SELECT id, name, created_at FROM service_types ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(service_types)
}

pub async fn get_service_type_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbServiceType>> {
    let service_type = sqlx::query_as::<_, DbServiceType>(
        "SELECT id, name, created_at FROM service_types WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service_type)
}

pub async fn create_service_type(pool: &Pool<Postgres>, name: &str) -> WorshipResult<DbServiceType> {
    sqlx::query_as::<_, DbServiceType>(
        r#"
        INSERT INTO service_types (id, name, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, name, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_or_db(e, format!("Service type {} already exists", name)))
}
