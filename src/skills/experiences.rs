use sqlx::{FromRow, SqlitePool};

use crate::{
    db::{Direction, Experience},
    error::{Result, StoreError},
    search,
};

pub const LEVELS: std::ops::RangeInclusive<i64> = 1..=5;

/// An experience joined with its skill, as shown on profile pages.
#[derive(Debug, Clone, FromRow)]
pub struct ExperienceView {
    pub id: i64,
    pub skill_id: i64,
    pub skill: String,
    pub level: i64,
    pub direction: Direction,
}

fn check_level(level: i64) -> Result<()> {
    if LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!(
            "level must be between {} and {}",
            LEVELS.start(),
            LEVELS.end()
        )))
    }
}

pub async fn add(
    db_pool: &SqlitePool,
    profile_id: i64,
    skill_id: i64,
    level: i64,
    direction: Direction,
) -> Result<Experience> {
    check_level(level)?;

    let id = sqlx::query(
        "INSERT INTO experiences (profile_id,skill_id,level,direction) VALUES (?,?,?,?)",
    )
    .bind(profile_id)
    .bind(skill_id)
    .bind(level)
    .bind(direction)
    .execute(db_pool)
    .await
    .map_err(StoreError::unique("experience for this skill"))?
    .last_insert_rowid();

    search::index::reindex_profile(db_pool, profile_id).await?;
    Ok(Experience { id, profile_id, skill_id, level, direction })
}

pub async fn get(db_pool: &SqlitePool, id: i64) -> Result<Experience> {
    sqlx::query_as("SELECT id,profile_id,skill_id,level,direction FROM experiences WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(StoreError::NotFound("experience"))
}

/// The user who owns the profile this experience belongs to.
pub async fn owner(db_pool: &SqlitePool, id: i64) -> Result<i64> {
    let (user_id,): (i64,) = sqlx::query_as(
        "SELECT p.user_id FROM experiences e JOIN profiles p ON p.id=e.profile_id WHERE e.id=?",
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(StoreError::NotFound("experience"))?;
    Ok(user_id)
}

pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    level: i64,
    direction: Direction,
) -> Result<Experience> {
    check_level(level)?;
    sqlx::query("UPDATE experiences SET level=?,direction=? WHERE id=?")
        .bind(level)
        .bind(direction)
        .bind(id)
        .execute(db_pool)
        .await?;
    get(db_pool, id).await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<()> {
    let experience = get(db_pool, id).await?;
    sqlx::query("DELETE FROM experiences WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    search::index::reindex_profile(db_pool, experience.profile_id).await
}

pub async fn list_for_profile(
    db_pool: &SqlitePool,
    profile_id: i64,
) -> Result<Vec<ExperienceView>> {
    Ok(sqlx::query_as(
        "SELECT e.id,e.skill_id,s.display_name AS skill,e.level,e.direction
         FROM experiences e JOIN skills s ON s.id=e.skill_id
         WHERE e.profile_id=?
         ORDER BY e.direction DESC, e.level DESC, s.name",
    )
    .bind(profile_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn has_direction(
    db_pool: &SqlitePool,
    user_id: i64,
    direction: Direction,
) -> Result<bool> {
    let found: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM experiences e JOIN profiles p ON p.id=e.profile_id
         WHERE p.user_id=? AND e.direction=? LIMIT 1",
    )
    .bind(user_id)
    .bind(direction)
    .fetch_optional(db_pool)
    .await?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, profiles, skills::catalog, users};

    async fn setup() -> (SqlitePool, i64, i64) {
        let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let user = users::store::create_user(&db_pool, "ada@example.com", "Ada", "")
            .await
            .unwrap();
        let profile = profiles::store::get_or_create(&db_pool, user.id).await.unwrap();
        let skill = catalog::create(&db_pool, "rust").await.unwrap();
        (db_pool, profile.id, skill.id)
    }

    #[tokio::test]
    async fn one_experience_per_skill_and_profile() {
        let (db_pool, profile_id, skill_id) = setup().await;
        add(&db_pool, profile_id, skill_id, 3, Direction::CanHelp).await.unwrap();
        let err = add(&db_pool, profile_id, skill_id, 1, Direction::WantHelp)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn levels_outside_range_are_rejected() {
        let (db_pool, profile_id, skill_id) = setup().await;
        for level in [0, 6] {
            let err = add(&db_pool, profile_id, skill_id, level, Direction::CanHelp)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Invalid(_)));
        }
    }

    #[tokio::test]
    async fn update_and_delete_round_out_the_lifecycle() {
        let (db_pool, profile_id, skill_id) = setup().await;
        let exp = add(&db_pool, profile_id, skill_id, 2, Direction::WantHelp).await.unwrap();

        let updated = update(&db_pool, exp.id, 4, Direction::CanHelp).await.unwrap();
        assert_eq!(updated.level, 4);
        assert_eq!(updated.direction, Direction::CanHelp);

        let views = list_for_profile(&db_pool, profile_id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].skill, "Rust");

        delete(&db_pool, exp.id).await.unwrap();
        assert!(matches!(get(&db_pool, exp.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn owner_is_the_profile_user() {
        let (db_pool, profile_id, skill_id) = setup().await;
        let exp = add(&db_pool, profile_id, skill_id, 2, Direction::WantHelp).await.unwrap();
        let profile = profiles::store::get(&db_pool, profile_id).await.unwrap();
        assert_eq!(owner(&db_pool, exp.id).await.unwrap(), profile.user_id);
        assert!(has_direction(&db_pool, profile.user_id, Direction::WantHelp).await.unwrap());
        assert!(!has_direction(&db_pool, profile.user_id, Direction::CanHelp).await.unwrap());
    }
}
