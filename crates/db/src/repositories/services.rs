use crate::models::DbService;
use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use worship_core::models::service::{CreateServiceRequest, UpdateServiceRequest};

const SERVICE_COLUMNS: &str = "id, service_type_id, date, title, leader_user_id, notes, created_at";

pub async fn list_services(
    pool: &Pool<Postgres>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<DbService>> {
    let services = sqlx::query_as::<_, DbService>(&format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services
        WHERE ($1::TIMESTAMPTZ IS NULL OR date >= $1)
          AND ($2::TIMESTAMPTZ IS NULL OR date <= $2)
        ORDER BY date ASC
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(services)
}

pub async fn get_service_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn create_service(
    pool: &Pool<Postgres>,
    request: &CreateServiceRequest,
) -> Result<DbService> {
    let id = Uuid::new_v4();

    tracing::debug!(
        "Creating service: id={}, service_type_id={}, date={}",
        id,
        request.service_type_id,
        request.date
    );

    let service = sqlx::query_as::<_, DbService>(&format!(
        r#"
        INSERT INTO services (id, service_type_id, date, title, leader_user_id, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(request.service_type_id)
    .bind(request.date)
    .bind(&request.title)
    .bind(request.leader_user_id)
    .bind(&request.notes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(service)
}

pub async fn update_service(
    pool: &Pool<Postgres>,
    id: Uuid,
    request: &UpdateServiceRequest,
) -> Result<DbService> {
    let service = get_service_by_id(pool, id)
        .await?
        .ok_or_else(|| eyre!("Service not found"))?;

    let updated = sqlx::query_as::<_, DbService>(&format!(
        r#"
        UPDATE services
        SET service_type_id = $2, date = $3, title = $4, leader_user_id = $5, notes = $6
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(request.service_type_id.unwrap_or(service.service_type_id))
    .bind(request.date.unwrap_or(service.date))
    .bind(request.title.as_ref().or(service.title.as_ref()))
    .bind(request.leader_user_id.unwrap_or(service.leader_user_id))
    .bind(match &request.notes {
        Some(notes) => notes.as_ref(),
        None => service.notes.as_ref(),
    })
    .fetch_one(pool)
    .await?;

    Ok(updated)
}
