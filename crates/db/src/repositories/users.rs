use crate::{conflict_or_db, models::DbUser};
use argon2::{Argon2, PasswordVerifier};
use chrono::Utc;
use eyre::{eyre, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use worship_core::{errors::WorshipResult, models::user::Role};

const USER_COLUMNS: &str = "id, email, name, password_hash, roles, created_at";

pub async fn create_user(
    pool: &Pool<Postgres>,
    email: &str,
    name: &str,
    password_hash: Option<&str>,
    roles: &[Role],
) -> WorshipResult<DbUser> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let roles: Vec<String> = roles.iter().map(|role| role.as_str().to_string()).collect();

    tracing::debug!("Creating user: id={}, email={}, roles={:?}", id, email, roles);

    sqlx::query_as::<_, DbUser>(&format!(
        r#"
        INSERT INTO users (id, email, name, password_hash, roles, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email.to_lowercase())
    .bind(name)
    .bind(password_hash)
    .bind(&roles)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_or_db(e, format!("A user with email {} already exists", email)))
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_users(pool: &Pool<Postgres>) -> Result<Vec<DbUser>> {
    let users = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY name ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn user_exists(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Looks up a user by email and checks the password against the stored
/// Argon2 hash. Returns `None` for unknown users, users without a password
/// and wrong passwords alike.
pub async fn verify_credentials(
    pool: &Pool<Postgres>,
    email: &str,
    password: &str,
) -> Result<Option<DbUser>> {
    let Some(user) = get_user_by_email(pool, email).await? else {
        return Ok(None);
    };

    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(None);
    };

    let parsed_hash =
        argon2::PasswordHash::new(hash).map_err(|e| eyre!("Invalid password hash: {}", e))?;
    let is_valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    Ok(is_valid.then_some(user))
}
