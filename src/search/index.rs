use sqlx::SqlitePool;

use crate::error::Result;

/// Rewrites the full-text row of one profile from its user, bio and skills.
pub async fn reindex_profile(db_pool: &SqlitePool, profile_id: i64) -> Result<()> {
    let document: Option<(String, String, String)> = sqlx::query_as(
        "SELECT u.first_name || ' ' || u.last_name, p.bio,
                COALESCE((SELECT group_concat(s.display_name, ' ')
                          FROM experiences e JOIN skills s ON s.id=e.skill_id
                          WHERE e.profile_id=p.id), '')
         FROM profiles p JOIN users u ON u.id=p.user_id
         WHERE p.id=?",
    )
    .bind(profile_id)
    .fetch_optional(db_pool)
    .await?;

    let mut tx = db_pool.begin().await?;
    sqlx::query("DELETE FROM profile_search WHERE rowid=?")
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;
    if let Some((name, bio, skills)) = document {
        sqlx::query("INSERT INTO profile_search (rowid,name,bio,skills) VALUES (?,?,?,?)")
            .bind(profile_id)
            .bind(name)
            .bind(bio)
            .bind(skills)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(())
}

pub async fn reindex_user(db_pool: &SqlitePool, user_id: i64) -> Result<()> {
    let profile_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    if let Some((profile_id,)) = profile_id {
        reindex_profile(db_pool, profile_id).await?;
    }
    Ok(())
}
