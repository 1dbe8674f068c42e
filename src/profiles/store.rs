use sqlx::SqlitePool;

use crate::{
    db::Profile,
    error::{Result, StoreError},
    search,
};

const PROFILE_COLUMNS: &str = "id,user_id,bio,can_help,help_wanted";

pub async fn get(db_pool: &SqlitePool, id: i64) -> Result<Profile> {
    sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(StoreError::NotFound("profile"))
}

pub async fn for_user(db_pool: &SqlitePool, user_id: i64) -> Result<Option<Profile>> {
    Ok(
        sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id=?"))
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?,
    )
}

/// Profiles are created lazily, the first time something needs one.
pub async fn get_or_create(db_pool: &SqlitePool, user_id: i64) -> Result<Profile> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING")
        .bind(user_id)
        .execute(db_pool)
        .await?;

    let profile = for_user(db_pool, user_id)
        .await?
        .ok_or(StoreError::NotFound("profile"))?;
    search::index::reindex_profile(db_pool, profile.id).await?;
    Ok(profile)
}

pub async fn update(
    db_pool: &SqlitePool,
    user_id: i64,
    bio: &str,
    can_help: bool,
    help_wanted: bool,
) -> Result<Profile> {
    sqlx::query(
        "INSERT INTO profiles (user_id,bio,can_help,help_wanted) VALUES (?,?,?,?)
         ON CONFLICT(user_id) DO UPDATE
         SET bio=excluded.bio,can_help=excluded.can_help,help_wanted=excluded.help_wanted",
    )
    .bind(user_id)
    .bind(bio.trim())
    .bind(can_help)
    .bind(help_wanted)
    .execute(db_pool)
    .await?;

    let profile = for_user(db_pool, user_id)
        .await?
        .ok_or(StoreError::NotFound("profile"))?;
    search::index::reindex_profile(db_pool, profile.id).await?;
    tracing::debug!(profile_id = profile.id, can_help, help_wanted, "profile saved");
    Ok(profile)
}
