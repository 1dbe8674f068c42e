use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db::{self, User},
    error::{Result, StoreError},
    search,
};

const USER_COLUMNS: &str =
    "id,uuid,email,first_name,last_name,is_active,is_staff,date_joined";

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(email.to_owned())
        }
        _ => Err(StoreError::Invalid(format!("'{email}' is not an email address"))),
    }
}

pub async fn create_user(
    db_pool: &SqlitePool,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let email = normalize_email(email)?;
    let uuid = Uuid::now_v7();

    let id = sqlx::query(
        "INSERT INTO users (uuid,email,first_name,last_name,date_joined) VALUES (?,?,?,?,?)",
    )
    .bind(uuid.to_string())
    .bind(&email)
    .bind(first_name.trim())
    .bind(last_name.trim())
    .bind(db::now())
    .execute(db_pool)
    .await
    .map_err(StoreError::unique("user with this email"))?
    .last_insert_rowid();

    tracing::info!(user_id = id, %uuid, "created user");
    get(db_pool, id).await
}

pub async fn get(db_pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(StoreError::NotFound("user"))
}

pub async fn find_by_uuid(db_pool: &SqlitePool, uuid: &str) -> Result<Option<User>> {
    Ok(
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE uuid=?"))
            .bind(uuid)
            .fetch_optional(db_pool)
            .await?,
    )
}

pub async fn find_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    Ok(
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email=?"))
            .bind(email.trim())
            .fetch_optional(db_pool)
            .await?,
    )
}

/// Finds the account behind a social login, creating it on first sight.
pub async fn find_or_create(
    db_pool: &SqlitePool,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    if let Some(user) = find_by_email(db_pool, email).await? {
        return Ok(user);
    }
    create_user(db_pool, email, first_name, last_name).await
}

pub async fn update_details(
    db_pool: &SqlitePool,
    id: i64,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let email = normalize_email(email)?;
    sqlx::query("UPDATE users SET email=?,first_name=?,last_name=? WHERE id=?")
        .bind(&email)
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(id)
        .execute(db_pool)
        .await
        .map_err(StoreError::unique("user with this email"))?;
    search::index::reindex_user(db_pool, id).await?;
    get(db_pool, id).await
}

/// Accounts are never deleted, only switched off.
pub async fn set_active(db_pool: &SqlitePool, id: i64, is_active: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET is_active=? WHERE id=?")
        .bind(is_active)
        .bind(id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("user"));
    }
    tracing::info!(user_id = id, is_active, "changed user activity");
    Ok(())
}

pub async fn set_staff(db_pool: &SqlitePool, id: i64, is_staff: bool) -> Result<()> {
    sqlx::query("UPDATE users SET is_staff=? WHERE id=?")
        .bind(is_staff)
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}
