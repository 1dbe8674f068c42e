use sqlx::SqlitePool;

use crate::{
    db::Skill,
    error::{Result, StoreError},
    search,
};

/// Lowercased, trimmed, single-spaced form used for uniqueness.
pub fn canonical_name(name: &str) -> Result<String> {
    let words: Vec<_> = name.split_whitespace().collect();
    if words.is_empty() {
        return Err(StoreError::Invalid("skill name is empty".into()));
    }
    Ok(words.join(" ").to_lowercase())
}

pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Inserts a new skill. The display name is derived here and only here.
pub async fn create(db_pool: &SqlitePool, name: &str) -> Result<Skill> {
    let canonical = canonical_name(name)?;
    let display_name = title_case(&canonical);

    let id = sqlx::query("INSERT INTO skills (name,display_name) VALUES (?,?)")
        .bind(&canonical)
        .bind(&display_name)
        .execute(db_pool)
        .await
        .map_err(StoreError::unique("skill"))?
        .last_insert_rowid();

    tracing::debug!(skill_id = id, name = %canonical, "created skill");
    Ok(Skill { id, name: canonical, display_name })
}

pub async fn get(db_pool: &SqlitePool, id: i64) -> Result<Skill> {
    sqlx::query_as("SELECT id,name,display_name FROM skills WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(StoreError::NotFound("skill"))
}

pub async fn find(db_pool: &SqlitePool, name: &str) -> Result<Option<Skill>> {
    Ok(
        sqlx::query_as("SELECT id,name,display_name FROM skills WHERE name=?")
            .bind(canonical_name(name)?)
            .fetch_optional(db_pool)
            .await?,
    )
}

pub async fn get_or_create(db_pool: &SqlitePool, name: &str) -> Result<Skill> {
    if let Some(skill) = find(db_pool, name).await? {
        return Ok(skill);
    }
    match create(db_pool, name).await {
        // lost a race with another insert of the same name
        Err(StoreError::Duplicate(_)) => find(db_pool, name)
            .await?
            .ok_or(StoreError::NotFound("skill")),
        other => other,
    }
}

/// Changes the display name verbatim, with no re-capitalisation.
pub async fn rename_display(db_pool: &SqlitePool, id: i64, display_name: &str) -> Result<Skill> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(StoreError::Invalid("display name is empty".into()));
    }
    let result = sqlx::query("UPDATE skills SET display_name=? WHERE id=?")
        .bind(display_name)
        .bind(id)
        .execute(db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound("skill"));
    }

    // profiles carry skill display names in their search documents
    let profile_ids: Vec<(i64,)> =
        sqlx::query_as("SELECT DISTINCT profile_id FROM experiences WHERE skill_id=?")
            .bind(id)
            .fetch_all(db_pool)
            .await?;
    for (profile_id,) in profile_ids {
        search::index::reindex_profile(db_pool, profile_id).await?;
    }

    get(db_pool, id).await
}

/// Skills whose canonical name starts with `prefix`, alphabetically.
pub async fn search(db_pool: &SqlitePool, prefix: &str, limit: i64) -> Result<Vec<Skill>> {
    let prefix = prefix.trim().to_lowercase();
    let pattern = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
        + "%";

    Ok(
        sqlx::query_as(
            "SELECT id,name,display_name FROM skills
             WHERE name LIKE ? ESCAPE '\\' ORDER BY name LIMIT ?",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(db_pool)
        .await?,
    )
}
