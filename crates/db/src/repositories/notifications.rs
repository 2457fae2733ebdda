use crate::models::DbNotification;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, read_at, created_at";

pub async fn list_for_user(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

pub async fn get_notification_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn create_notification(
    pool: &Pool<Postgres>,
    user_id: Uuid,
    kind: &str,
    title: &str,
    body: &str,
) -> Result<DbNotification> {
    let id = Uuid::new_v4();

    tracing::debug!("Creating notification: id={}, user_id={}, kind={}", id, user_id, kind);

    let notification = sqlx::query_as::<_, DbNotification>(&format!(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, body, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

/// Sets `read_at` on first read; later calls keep the original timestamp.
pub async fn mark_read(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(&format!(
        r#"
        UPDATE notifications
        SET read_at = COALESCE(read_at, $2)
        WHERE id = $1
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}
